use csv::Reader;
use std::io::Read;
use std::path::Path;

use serde::{Serialize, Deserialize};

/// One household member eligible for dish duty. The avatar is display
/// metadata only; identity is the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMember {
    pub name: String,
    pub avatar: String,
}

/// The built-in household roster, used when no roster file exists.
pub fn default_roster() -> Vec<RosterMember> {
    [
        ("Yonatan", "👨‍💼"),
        ("Ohad", "👨‍💻"),
        ("Raz", "👨‍🎓"),
        ("Yuval", "👨‍🔬"),
    ]
    .iter()
    .map(|(name, avatar)| RosterMember {
        name: name.to_string(),
        avatar: avatar.to_string(),
    })
    .collect()
}

/// Loads the roster from a two-column CSV (`name,avatar`). A missing file
/// falls back to the built-in roster; blank names are skipped and duplicate
/// names collapsed, keeping the first occurrence.
pub fn load_roster(path: &Path) -> Result<Vec<RosterMember>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(default_roster());
    }
    let reader = Reader::from_path(path)?;
    parse_roster(reader)
}

fn parse_roster<R: Read>(mut reader: Reader<R>) -> Result<Vec<RosterMember>, Box<dyn std::error::Error>> {
    let mut roster: Vec<RosterMember> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let name = record.get(0).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        if roster.iter().any(|m| m.name == name) {
            continue;
        }
        let avatar = record.get(1).unwrap_or("").trim();
        roster.push(RosterMember {
            name: name.to_string(),
            avatar: if avatar.is_empty() { "🧑".to_string() } else { avatar.to_string() },
        });
    }

    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    fn parse(data: &str) -> Vec<RosterMember> {
        let reader = ReaderBuilder::new().from_reader(data.as_bytes());
        parse_roster(reader).unwrap()
    }

    #[test]
    fn parses_names_and_avatars() {
        let roster = parse("name,avatar\nYonatan,A\nOhad,B\n");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Yonatan");
        assert_eq!(roster[1].avatar, "B");
    }

    #[test]
    fn skips_blanks_and_duplicates() {
        let roster = parse("name,avatar\nRaz,A\n ,B\nRaz,C\nYuval,\n");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].avatar, "A");
        assert_eq!(roster[1].name, "Yuval");
        assert_eq!(roster[1].avatar, "🧑");
    }

    #[test]
    fn missing_file_uses_default_roster() {
        let dir = tempfile::tempdir().unwrap();
        let roster = load_roster(&dir.path().join("roster.csv")).unwrap();
        assert_eq!(roster.len(), 4);
        assert!(roster.iter().any(|m| m.name == "Yonatan"));
    }
}
