//! QR Payload - canonical ordered field string
//!
//! Twenty trimmed fields joined by `|`. Nothing is escaped, so field values
//! must not contain the separator themselves.

use crate::record::{FieldName, LabelRecord};

pub const PAYLOAD_SEPARATOR: char = '|';

/// Field order of the payload. `Rev` and `Num` are appended for every label
/// type, not only substrate labels.
pub const PAYLOAD_FIELDS: [FieldName; 20] = [
    FieldName::SandiskPn,
    FieldName::HuNumber,
    FieldName::BatchNumber,
    FieldName::Mpn,
    FieldName::DateCode,
    FieldName::ExpiryDate,
    FieldName::Coo,
    FieldName::Msl,
    FieldName::IbdNumber,
    FieldName::GrDate,
    FieldName::VendorCode,
    FieldName::PlantCode,
    FieldName::MaterialDesc,
    FieldName::PoNumber,
    FieldName::PoLine,
    FieldName::Quantity,
    FieldName::VendorLot,
    FieldName::Asn,
    FieldName::Rev,
    FieldName::Num,
];

pub fn qr_payload(record: &LabelRecord) -> String {
    let mut out = String::new();
    for (i, field) in PAYLOAD_FIELDS.iter().enumerate() {
        if i > 0 {
            out.push(PAYLOAD_SEPARATOR);
        }
        out.push_str(record.get(*field).trim());
    }
    out
}
