//! Glyph capabilities - CODE128 and QR module patterns
//!
//! Thin adapters over the symbology crates. Callers only see module grids;
//! a value the symbology cannot carry comes back as `None`.

use barcoders::sym::code128::Code128;
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

/// Code set B start marker understood by `barcoders`.
const CODE128_SET_B: char = 'Ɓ';

/// Bar modules (`true` = dark) for `value`, quiet zones excluded.
pub fn code128_modules(value: &str) -> Option<Vec<bool>> {
    let symbol = match Code128::new(format!("{CODE128_SET_B}{value}")) {
        Ok(symbol) => symbol,
        Err(e) => {
            debug!("code128 cannot encode {:?}: {:?}", value, e);
            return None;
        }
    };
    Some(symbol.encode().into_iter().map(|m| m == 1).collect())
}

/// Square QR module grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    pub width: usize,
    pub dark: Vec<bool>,
}

impl QrMatrix {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }
}

/// QR symbol at error correction level M.
pub fn qr_matrix(payload: &str) -> Option<QrMatrix> {
    let code = match QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M) {
        Ok(code) => code,
        Err(e) => {
            debug!("qr cannot encode payload of {} bytes: {}", payload.len(), e);
            return None;
        }
    };
    Some(QrMatrix {
        width: code.width(),
        dark: code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_pattern_shape() {
        let short = code128_modules("PO123").unwrap();
        let long = code128_modules("PO1234").unwrap();
        // one more set-B symbol is 11 modules
        assert_eq!(long.len(), short.len() + 11);
        assert!(short[0]);
        assert!(*short.last().unwrap());
    }

    #[test]
    fn test_code128_rejects_non_ascii() {
        assert!(code128_modules("数量").is_none());
    }

    #[test]
    fn test_qr_matrix_is_square() {
        let matrix = qr_matrix("SDUC064G|11030452518V3000594|||2518").unwrap();
        assert!(matrix.width >= 21);
        assert_eq!(matrix.dark.len(), matrix.width * matrix.width);
        // finder pattern corner
        assert!(matrix.is_dark(0, 0));
    }
}
