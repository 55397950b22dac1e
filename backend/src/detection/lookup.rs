use std::collections::HashMap;

/// Maps the object-detection endpoint's class indices to horse names.
#[derive(Debug, Clone, Default)]
pub struct ClassMap {
    names: HashMap<u32, String>,
}

impl ClassMap {
    pub fn new(names: HashMap<u32, String>) -> Self {
        Self { names }
    }

    pub fn name_of(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Maps the ID codes painted on a horse's gear to the horse's name.
///
/// Codes are stored trimmed and uppercased so lookups can normalize the
/// detected text the same way.
#[derive(Debug, Clone, Default)]
pub struct HorseIdCodeMap {
    codes: HashMap<String, String>,
}

impl HorseIdCodeMap {
    pub fn new(codes: HashMap<String, String>) -> Self {
        let codes = codes
            .into_iter()
            .map(|(code, name)| (normalize_code(&code), name))
            .filter(|(code, _)| !code.is_empty())
            .collect();
        Self { codes }
    }

    /// Returns the horse for a piece of detected text, if the text is exactly
    /// one of the known codes (ignoring surrounding whitespace and case).
    pub fn horse_for(&self, text: &str) -> Option<&str> {
        let code = normalize_code(text);
        if code.is_empty() {
            return None;
        }
        self.codes.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horse_ids() -> HorseIdCodeMap {
        HorseIdCodeMap::new(HashMap::from([
            ("K131".to_string(), "Prestige Good".to_string()),
            (" h344".to_string(), "Ping Hai Comet".to_string()),
            ("".to_string(), "Nobody".to_string()),
        ]))
    }

    #[test]
    fn codes_match_trimmed_and_case_insensitive() {
        let ids = horse_ids();
        assert_eq!(ids.horse_for(" k131 "), Some("Prestige Good"));
        assert_eq!(ids.horse_for("H344"), Some("Ping Hai Comet"));
        assert_eq!(ids.horse_for("K1310"), None);
        assert_eq!(ids.horse_for("K 131"), None);
    }

    #[test]
    fn blank_codes_are_ignored() {
        let ids = horse_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.horse_for("   "), None);
        assert_eq!(ids.horse_for(""), None);
    }

    #[test]
    fn class_lookup() {
        let classes = ClassMap::new(HashMap::from([(0, "Prestige Good".to_string())]));
        assert_eq!(classes.name_of(0), Some("Prestige Good"));
        assert_eq!(classes.name_of(3), None);
        assert_eq!(classes.len(), 1);
    }
}
