//! Default drink catalog.
//!
//! Approximate per-serving values for common drinks; brands vary. The catalog
//! is only consulted when a drink is logged, so edits here never change an
//! already-recorded event.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Grams of ethanol in one US standard drink
pub const STANDARD_DRINK_GRAMS: f64 = 14.0;

/// Ethanol density (g/mL)
pub const ETHANOL_DENSITY: f64 = 0.789;

/// Millilitres per US fluid ounce
pub const ML_PER_FL_OZ: f64 = 29.5735;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: prefer `get_default_catalog()` outside of tests.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

/// Standard drinks in `serving_oz` of a beverage at `abv` (0 to 1)
pub fn standard_drinks_from_volume(serving_oz: f64, abv: f64) -> f64 {
    serving_oz * ML_PER_FL_OZ * abv * ETHANOL_DENSITY / STANDARD_DRINK_GRAMS
}

fn generic(id: &str, name: &str, abv: f64, serving_oz: f64) -> CatalogEntry {
    CatalogEntry {
        id: id.into(),
        name: name.into(),
        category: DrinkCategory::Generic,
        abv,
        serving_oz,
        standard_drinks: 1.0,
        nutrients: Nutrients::default(),
        brand: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    name: &str,
    category: DrinkCategory,
    abv: f64,
    serving_oz: f64,
    calories: f64,
    carbs_g: f64,
    sugar_g: f64,
    brand: Option<&str>,
) -> CatalogEntry {
    CatalogEntry {
        id: id.into(),
        name: name.into(),
        category,
        abv,
        serving_oz,
        standard_drinks: standard_drinks_from_volume(serving_oz, abv),
        nutrients: Nutrients {
            calories,
            carbs_g,
            sugar_g,
        },
        brand: brand.map(Into::into),
    }
}

fn build_default_catalog_internal() -> Catalog {
    use DrinkCategory::*;

    let entries = vec![
        // Generic servings, exactly one standard drink each
        generic("beer", "Beer (5%)", 0.05, 12.0),
        generic("wine", "Wine (12%)", 0.12, 5.0),
        generic("liquor", "Spirit (40%)", 0.40, 1.5),
        generic("seltzer", "Hard seltzer (5%)", 0.05, 12.0),
        // Light beers
        entry("bud-light", "Bud Light", Beer, 0.042, 12.0, 110.0, 6.6, 0.0, Some("Budweiser")),
        entry("coors-light", "Coors Light", Beer, 0.042, 12.0, 102.0, 5.0, 0.0, Some("Coors")),
        entry("michelob-ultra", "Michelob Ultra", Beer, 0.04, 12.0, 96.0, 3.2, 0.0, Some("Michelob")),
        entry("miller-lite", "Miller Lite", Beer, 0.042, 12.0, 99.0, 3.9, 0.0, Some("Miller")),
        entry("corona-light", "Corona Light", Beer, 0.04, 12.0, 95.0, 2.6, 0.0, Some("Corona")),
        entry("blue-moon", "Blue Moon", Beer, 0.045, 12.0, 140.0, 10.0, 0.0, Some("Blue Moon")),
        entry("budweiser", "Budweiser", Beer, 0.05, 12.0, 145.0, 13.0, 0.0, Some("Budweiser")),
        entry("corona-extra", "Corona Extra", Beer, 0.051, 12.0, 149.0, 10.6, 0.0, Some("Corona")),
        // IPAs / craft
        entry("ipa-typical", "IPA (typical)", Beer, 0.055, 12.0, 170.0, 15.0, 0.0, None),
        entry("double-ipa", "Double IPA", Beer, 0.065, 12.0, 200.0, 18.0, 0.0, None),
        entry("sierra-pale", "Sierra Nevada Pale Ale", Beer, 0.052, 12.0, 180.0, 16.0, 0.0, Some("Sierra Nevada")),
        // Hard seltzers
        entry("white-claw-5", "White Claw (5%)", Seltzer, 0.05, 12.0, 100.0, 2.0, 0.0, Some("White Claw")),
        entry("white-claw-70", "White Claw 70", Seltzer, 0.07, 12.0, 130.0, 2.0, 0.0, Some("White Claw")),
        entry("truly", "Truly", Seltzer, 0.05, 12.0, 100.0, 1.0, 0.0, Some("Truly")),
        entry("high-noon", "High Noon", Seltzer, 0.05, 12.0, 95.0, 0.0, 0.0, Some("High Noon")),
        entry("vizzy", "Vizzy", Seltzer, 0.045, 12.0, 90.0, 0.0, 0.0, Some("Vizzy")),
        entry("bud-seltzer", "Bud Light Seltzer", Seltzer, 0.05, 12.0, 110.0, 4.0, 1.0, Some("Bud Light")),
        // Wine
        entry("red-wine", "Red wine (5 oz)", Wine, 0.12, 5.0, 120.0, 4.0, 1.0, None),
        entry("white-wine", "White wine (5 oz)", Wine, 0.12, 5.0, 120.0, 4.0, 1.5, None),
        entry("rose", "Rosé (5 oz)", Wine, 0.12, 5.0, 125.0, 4.0, 2.0, None),
        entry("champagne", "Champagne (5 oz)", Wine, 0.09, 5.0, 90.0, 4.0, 1.5, None),
        entry("wine-spritzer", "Wine spritzer (8 oz)", Wine, 0.12, 8.0, 180.0, 5.0, 3.0, None),
        // Liquor, 1.5 oz shot
        entry("vodka", "Vodka (1.5 oz)", Liquor, 0.40, 1.5, 96.0, 0.0, 0.0, None),
        entry("rum", "Rum (1.5 oz)", Liquor, 0.40, 1.5, 96.0, 0.0, 0.0, None),
        entry("tequila", "Tequila (1.5 oz)", Liquor, 0.40, 1.5, 96.0, 0.0, 0.0, None),
        entry("whiskey", "Whiskey (1.5 oz)", Liquor, 0.40, 1.5, 96.0, 0.0, 0.0, None),
        entry("jack-daniels", "Jack Daniel's", Liquor, 0.40, 1.5, 105.0, 0.0, 0.0, Some("Jack Daniel's")),
        entry("fireball", "Fireball (1.5 oz)", Liquor, 0.35, 1.5, 97.0, 0.0, 11.0, Some("Fireball")),
        // Cocktails, per drink
        entry("margarita", "Margarita", Cocktail, 0.18, 4.0, 180.0, 8.0, 7.0, None),
        entry("vodka-soda", "Vodka soda", Cocktail, 0.15, 4.0, 160.0, 6.0, 0.0, None),
        entry("long-island", "Long Island Iced Tea", Cocktail, 0.20, 4.0, 200.0, 15.0, 12.0, None),
        entry("mai-tai", "Mai Tai", Cocktail, 0.14, 5.0, 220.0, 25.0, 20.0, None),
        entry("moscow-mule", "Moscow Mule", Cocktail, 0.12, 6.0, 180.0, 12.0, 8.0, None),
        entry("whiskey-coke", "Whiskey Coke", Cocktail, 0.15, 4.0, 150.0, 10.0, 10.0, None),
        entry("boilermaker", "Beer + shot (boilermaker)", Cocktail, 0.10, 12.0, 140.0, 14.0, 0.0, None),
    ];

    Catalog {
        entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
    }
}

impl Catalog {
    /// Look up a drink by id
    pub fn get(&self, id: &str) -> Result<&CatalogEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("catalog entry '{}'", id)))
    }

    /// Entries grouped by category, each group sorted by display name
    pub fn by_category(&self) -> BTreeMap<DrinkCategory, Vec<&CatalogEntry>> {
        let mut groups: BTreeMap<DrinkCategory, Vec<&CatalogEntry>> = BTreeMap::new();
        for entry in self.entries.values() {
            groups.entry(entry.category).or_default().push(entry);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, entry) in &self.entries {
            if id.is_empty() || entry.id.is_empty() {
                errors.push("Catalog entry has empty ID".to_string());
            }
            if id != &entry.id {
                errors.push(format!(
                    "Catalog key '{}' doesn't match entry.id '{}'",
                    id, entry.id
                ));
            }
            if entry.name.is_empty() {
                errors.push(format!("Catalog entry '{}' has empty name", id));
            }
            if !(entry.abv > 0.0 && entry.abv < 1.0) {
                errors.push(format!("Catalog entry '{}': abv {} out of range", id, entry.abv));
            }
            if !(entry.serving_oz > 0.0) {
                errors.push(format!(
                    "Catalog entry '{}': serving_oz must be positive",
                    id
                ));
            }
            if !(entry.standard_drinks.is_finite() && entry.standard_drinks > 0.0) {
                errors.push(format!(
                    "Catalog entry '{}': standard_drinks must be positive",
                    id
                ));
            }
            if let Err(e) = entry.nutrients.validate() {
                errors.push(format!("Catalog entry '{}': {}", id, e));
            }
        }

        errors
    }
}
