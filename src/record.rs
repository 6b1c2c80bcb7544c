//! Label Record - the single mutable entity of a session
//!
//! A flat set of text fields. The set is fixed and total: every field always
//! holds a string, possibly empty. Quantities and codes are never parsed.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::LabelConfig;
use crate::datecode::date_code;
use crate::identifier::hu_number;
use crate::policy::FieldError;

macro_rules! label_fields {
    ($($variant:ident => $field:ident : $wire:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(default)]
        pub struct LabelRecord {
            $(
                #[serde(rename = $wire)]
                pub $field: String,
            )+
        }

        /// Name of one `LabelRecord` field, spelled on the wire in camelCase.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldName {
            $($variant,)+
        }

        impl FieldName {
            pub const ALL: &'static [FieldName] = &[$(FieldName::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(FieldName::$variant => $wire,)+
                }
            }
        }

        impl FromStr for FieldName {
            type Err = FieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(FieldName::$variant),)+
                    other => Err(FieldError::UnknownField(other.to_string())),
                }
            }
        }

        impl LabelRecord {
            pub fn get(&self, field: FieldName) -> &str {
                match field {
                    $(FieldName::$variant => &self.$field,)+
                }
            }

            pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
                let value = value.into();
                match field {
                    $(FieldName::$variant => self.$field = value,)+
                }
            }
        }
    };
}

label_fields! {
    // common
    SupplierName => supplier_name: "supplierName",
    PoNumber => po_number: "poNumber",
    PoLine => po_line: "poLine",
    HuNumber => hu_number: "huNumber",
    IbdNumber => ibd_number: "ibdNumber",
    BatchNumber => batch_number: "batchNumber",
    SandiskPn => sandisk_pn: "sandiskPN",
    Quantity => quantity: "quantity",
    Mpn => mpn: "mpn",
    VendorLot => vendor_lot: "vendorLot",
    ExpiryDate => expiry_date: "expiryDate",
    Coo => coo: "coo",
    DateCode => date_code: "dateCode",
    BoxNo => box_no: "boxNo",
    PrintDate => print_date: "printDate",
    // QR only
    Msl => msl: "msl",
    GrDate => gr_date: "grDate",
    VendorCode => vendor_code: "vendorCode",
    PlantCode => plant_code: "plantCode",
    MaterialDesc => material_desc: "materialDesc",
    Asn => asn: "asn",
    // substrate only
    Rev => rev: "rev",
    Num => num: "num",
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LabelRecord {
    /// Record for a fresh session: policy defaults from `config`, print date,
    /// then the date code and an identifier derived from it, all taken at `now`.
    pub fn initial(config: &LabelConfig, now: DateTime<Local>) -> Self {
        let date_code = date_code(now.date_naive());
        let hu_number = hu_number(&date_code, now.time());

        Self {
            supplier_name: config.supplier_name.clone(),
            vendor_lot: config.vendor_lot.clone(),
            expiry_date: config.expiry_date.clone(),
            coo: config.coo.clone(),
            box_no: config.box_no.clone(),
            vendor_code: config.vendor_code.clone(),
            plant_code: config.plant_code.clone(),
            print_date: now.format("%d/%m/%Y").to_string(),
            date_code,
            hu_number,
            ..Self::default()
        }
    }

    /// Replaces the date code only; an identifier generated earlier keeps
    /// the code it was built with.
    pub fn regenerate_date_code(&mut self, now: DateTime<Local>) {
        self.date_code = date_code(now.date_naive());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    #[test]
    fn test_field_names_round_trip() {
        assert_eq!(FieldName::ALL.len(), 23);
        for field in FieldName::ALL {
            assert_eq!(field.as_str().parse::<FieldName>().unwrap(), *field);
        }
        assert!("sandiskPn".parse::<FieldName>().is_err());
    }

    #[test]
    fn test_default_is_total_and_empty() {
        let record = LabelRecord::default();
        for field in FieldName::ALL {
            assert_eq!(record.get(*field), "");
        }
    }

    #[test]
    fn test_get_set() {
        let mut record = LabelRecord::default();
        record.set(FieldName::Quantity, "0050");
        assert_eq!(record.quantity, "0050");
        assert_eq!(record.get(FieldName::Quantity), "0050");
    }

    #[test]
    fn test_initial_applies_defaults_and_derived_fields() {
        let record = LabelRecord::initial(&LabelConfig::default(), at(2025, 4, 30, 10, 30, 45));
        assert_eq!(record.supplier_name, "ELCOMP TRADING SDN BHD");
        assert_eq!(record.coo, "JP");
        assert_eq!(record.expiry_date, "31-12-50");
        assert_eq!(record.vendor_code, "3000594");
        assert_eq!(record.plant_code, "C039");
        assert_eq!(record.box_no, "1");
        assert_eq!(record.print_date, "30/04/2025");
        assert_eq!(record.date_code, "2518");
        assert_eq!(record.hu_number, "11030452518V3000594");
        assert_eq!(record.po_number, "");
    }

    #[test]
    fn test_regenerating_date_code_keeps_identifier() {
        let mut record = LabelRecord::initial(&LabelConfig::default(), at(2025, 4, 30, 10, 30, 45));
        record.regenerate_date_code(at(2025, 12, 31, 8, 0, 0));
        assert_eq!(record.date_code, "2601");
        assert_eq!(record.hu_number, "11030452518V3000594");
    }

    #[test]
    fn test_json_uses_wire_names_and_tolerates_missing_keys() {
        let record: LabelRecord =
            serde_json::from_str(r#"{"sandiskPN": "SDUC064G", "poLine": "10"}"#).unwrap();
        assert_eq!(record.sandisk_pn, "SDUC064G");
        assert_eq!(record.po_line, "10");
        assert_eq!(record.asn, "");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sandiskPN"], "SDUC064G");
        assert_eq!(value["huNumber"], "");
    }
}
