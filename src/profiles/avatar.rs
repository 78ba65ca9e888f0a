use serde::{Deserialize, Serialize};

pub const UNKNOWN_COLOR: &str = "#6B7280";

pub const PALETTE: [&str; 20] = [
    "#E53E3E", "#319795", "#3182CE", "#DD6B20", "#38A169",
    "#D69E2E", "#9F7AEA", "#3182CE", "#ED8936", "#48BB78",
    "#E53E3E", "#3182CE", "#D69E2E", "#4299E1", "#38A169",
    "#E53E3E", "#9F7AEA", "#319795", "#D69E2E", "#4299E1",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    #[serde(rename = "char")]
    pub letter: String,
    pub color: String,
}

impl Avatar {
    pub fn unknown() -> Avatar {
        Avatar {
            letter: "?".to_owned(),
            color: UNKNOWN_COLOR.to_owned(),
        }
    }
}

/// Letter and colour for any display name. Colour index is the first UTF-16
/// unit plus the UTF-16 length, modulo the palette size.
pub fn generate_avatar(name: Option<&str>) -> Avatar {
    let Some(first) = name.and_then(|name| name.chars().next()) else {
        return Avatar::unknown();
    };
    let name = name.unwrap_or_default();

    let first_unit = name.encode_utf16().next().unwrap_or_default() as usize;
    let length = name.encode_utf16().count();
    let color = PALETTE[(first_unit + length) % PALETTE.len()];

    Avatar {
        letter: first.to_uppercase().to_string(),
        color: color.to_owned(),
    }
}
