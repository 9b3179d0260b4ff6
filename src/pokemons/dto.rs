use serde::{Deserialize, Serialize};

/// Number of pokemons returned per listing page.
pub const PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonName {
    pub english: String,
    pub japanese: String,
    pub chinese: String,
    pub french: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BaseStats {
    #[serde(rename = "HP")]
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pokemon {
    pub id: i32,
    pub name: PokemonName,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub base: BaseStats,
    pub image: String,
}

/// Partial update body; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonPatch {
    pub name: Option<PokemonName>,
    #[serde(rename = "type")]
    pub types: Option<Vec<String>>,
    pub base: Option<BaseStats>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Case-insensitive substring filters; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PokemonFilter {
    pub name: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PokemonPage {
    pub results: Vec<Pokemon>,
    pub total: i64,
}

impl ListQuery {
    pub fn filter(&self) -> PokemonFilter {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        PokemonFilter {
            name: clean(&self.name),
            kind: clean(&self.kind),
        }
    }

    /// Row offset for the requested 1-based page; pages below 1 clamp to 1.
    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1).saturating_mul(PAGE_SIZE)
    }
}

impl PokemonName {
    fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("english", &self.english),
            ("japanese", &self.japanese),
            ("chinese", &self.chinese),
            ("french", &self.french),
        ] {
            if value.trim().is_empty() {
                return Err(format!("name.{field} is required"));
            }
        }
        Ok(())
    }
}

fn validate_types(types: &[String]) -> Result<(), String> {
    if types.is_empty() || types.iter().any(|t| t.trim().is_empty()) {
        return Err("type must be a non-empty list of names".into());
    }
    Ok(())
}

impl Pokemon {
    pub fn validate(&self) -> Result<(), String> {
        self.name.validate()?;
        validate_types(&self.types)?;
        if self.image.trim().is_empty() {
            return Err("image is required".into());
        }
        Ok(())
    }
}

impl PokemonPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            name.validate()?;
        }
        if let Some(types) = &self.types {
            validate_types(types)?;
        }
        if matches!(&self.image, Some(i) if i.trim().is_empty()) {
            return Err("image must not be empty".into());
        }
        Ok(())
    }

    /// Applies the patch, returning whether anything changed.
    pub fn apply(&self, target: &mut Pokemon) -> bool {
        let before = target.clone();
        if let Some(name) = &self.name {
            target.name = name.clone();
        }
        if let Some(types) = &self.types {
            target.types = types.clone();
        }
        if let Some(base) = self.base {
            target.base = base;
        }
        if let Some(image) = &self.image {
            target.image = image.clone();
        }
        *target != before
    }
}

#[cfg(test)]
pub(crate) fn sample(id: i32, french: &str, types: &[&str]) -> Pokemon {
    Pokemon {
        id,
        name: PokemonName {
            english: format!("{french}-en"),
            japanese: format!("{french}-ja"),
            chinese: format!("{french}-zh"),
            french: french.to_string(),
        },
        types: types.iter().map(|t| t.to_string()).collect(),
        base: BaseStats {
            hp: 45,
            attack: 49,
            defense: 49,
            special_attack: 65,
            special_defense: 65,
            speed: 45,
        },
        image: format!("images/{id:03}.png"),
    }
}
