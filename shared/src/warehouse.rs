//! Warehouse name resolution
//!
//! Stock records were keyed by hand-typed branch names for years, so the same
//! location shows up as "G.Kottayam", "Kottayam", "KOTTAYAM BRANCH" and so on.
//! [`WarehouseNameResolver`] maps every spelling onto one canonical key and
//! answers fuzzy "is this the same place" questions.

use std::collections::HashMap;

/// Canonical name of the central distribution warehouse
pub const CENTRAL_WAREHOUSE: &str = "Warehouse";

const BRANCH_SUFFIX: &str = " Branch";
const STRIPPED_SUFFIXES: [&str; 2] = [" branch", " warehouse"];

/// Built-in alias table, extended by configuration at startup
pub fn default_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Warehouse", CENTRAL_WAREHOUSE),
        ("Main Warehouse", CENTRAL_WAREHOUSE),
        ("Central Warehouse", CENTRAL_WAREHOUSE),
        ("WH", CENTRAL_WAREHOUSE),
        ("Head Office", CENTRAL_WAREHOUSE),
        ("G.Edappally", "Edappally Branch"),
        ("G. Edappally", "Edappally Branch"),
        ("Edapally", "Edappally Branch"),
        ("Z.Kottayam", "Kottayam Branch"),
        ("Z. Kottayam", "Kottayam Branch"),
        ("SG-Thrissur", "Thrissur Branch"),
        ("SG-Trichur", "Thrissur Branch"),
        ("Trichur", "Thrissur Branch"),
        ("SG-Calicut", "Kozhikode Branch"),
        ("Calicut", "Kozhikode Branch"),
        ("Calicut Branch", "Kozhikode Branch"),
        ("G.Trivandrum", "Trivandrum Branch"),
        ("TVM", "Trivandrum Branch"),
        ("Thiruvananthapuram", "Trivandrum Branch"),
        ("Cochin", "Kochi Branch"),
        ("Alleppey", "Alappuzha Branch"),
    ]
}

/// Historical spellings of the same city that must compare equal
pub fn default_equivalents() -> Vec<Vec<&'static str>> {
    vec![
        vec!["trivandrum", "thiruvananthapuram", "trivandram", "tvm"],
        vec!["kozhikode", "calicut"],
        vec!["thrissur", "trichur"],
        vec!["alappuzha", "alleppey"],
        vec!["kochi", "cochin"],
    ]
}

/// Immutable alias table plus the fuzzy matching cascade
#[derive(Debug, Clone)]
pub struct WarehouseNameResolver {
    central: String,
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
    equivalents: Vec<Vec<String>>,
}

impl Default for WarehouseNameResolver {
    fn default() -> Self {
        Self::new(
            CENTRAL_WAREHOUSE,
            default_aliases()
                .into_iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string())),
            default_equivalents()
                .into_iter()
                .map(|set| set.into_iter().map(str::to_string).collect()),
        )
    }
}

impl WarehouseNameResolver {
    /// Build a resolver from an alias table and equivalence sets.
    ///
    /// Alias chains (`a -> b`, `b -> c`) are flattened and every canonical
    /// name is registered as an alias of itself, so normalizing a canonical
    /// name is always a no-op.
    pub fn new(
        central: &str,
        aliases: impl IntoIterator<Item = (String, String)>,
        equivalents: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        let central = match collapse_whitespace(central) {
            name if name.is_empty() => CENTRAL_WAREHOUSE.to_string(),
            name => name,
        };

        let mut raw: HashMap<String, String> = HashMap::new();
        for (alias, canonical) in aliases {
            let alias = collapse_whitespace(&alias);
            let canonical = collapse_whitespace(&canonical);
            if alias.is_empty() || canonical.is_empty() {
                continue;
            }
            raw.insert(alias, canonical);
        }
        raw.insert(central.clone(), central.clone());

        let mut exact: HashMap<String, String> = raw
            .keys()
            .map(|alias| (alias.clone(), follow_chain(&raw, alias)))
            .collect();
        let targets: Vec<String> = exact.values().cloned().collect();
        for target in targets {
            exact.insert(target.clone(), target);
        }

        let mut keys: Vec<&String> = exact.keys().collect();
        // Canonical names claim their case-folded slot before any alias does
        keys.sort_by_key(|key| (exact.get(*key) != Some(*key), (*key).clone()));
        let mut folded = HashMap::new();
        for key in keys {
            folded
                .entry(key.to_lowercase())
                .or_insert_with(|| exact[key].clone());
        }

        let equivalents = equivalents
            .into_iter()
            .map(|set| {
                set.into_iter()
                    .map(|name| collapse_whitespace(&name).to_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|set| set.len() > 1)
            .collect();

        Self {
            central,
            exact,
            folded,
            equivalents,
        }
    }

    /// Canonical name of the central warehouse
    pub fn central(&self) -> &str {
        &self.central
    }

    /// Map a free-text warehouse name onto its canonical identity
    pub fn normalize(&self, raw: &str) -> String {
        let name = collapse_whitespace(raw);
        if name.is_empty() {
            return name;
        }
        if let Some(canonical) = self.lookup(&name) {
            return canonical.clone();
        }
        let fallback = self.fallback(&name);
        self.lookup(&fallback).cloned().unwrap_or(fallback)
    }

    /// True when the name resolves to the central warehouse
    pub fn is_central(&self, raw: &str) -> bool {
        self.normalize(raw) == self.central
    }

    /// Permissive equality test between two warehouse names.
    ///
    /// Rules are tried strictest first: canonical equality, base-name
    /// equality, substring containment, then same-city equivalence sets.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        let left = self.normalize(a);
        let right = self.normalize(b);
        if left.is_empty() || right.is_empty() {
            return left == right;
        }
        if left.eq_ignore_ascii_case(&right) {
            return true;
        }

        let left_base = base_name(&left);
        let right_base = base_name(&right);
        if left_base == right_base {
            return true;
        }
        if left_base.contains(&right_base) || right_base.contains(&left_base) {
            return true;
        }

        let left_raw = collapse_whitespace(a).to_lowercase();
        let right_raw = collapse_whitespace(b).to_lowercase();
        self.equivalents.iter().any(|set| {
            in_equivalence_set(set, &left_raw, &left_base)
                && in_equivalence_set(set, &right_raw, &right_base)
        })
    }

    fn lookup(&self, name: &str) -> Option<&String> {
        self.exact
            .get(name)
            .or_else(|| self.folded.get(&name.to_lowercase()))
    }

    /// Strip prefixes and suffixes; a stripped form that is itself an alias
    /// resolves through the table before a new " Branch" key is minted
    fn fallback(&self, name: &str) -> String {
        let unprefixed = strip_letter_prefixes(name);
        if unprefixed.eq_ignore_ascii_case(&self.central) {
            return self.central.clone();
        }
        if let Some(canonical) = self.lookup(unprefixed) {
            return canonical.clone();
        }
        let base = strip_letter_prefixes(strip_location_suffix(name));
        if let Some(canonical) = self.lookup(base) {
            return canonical.clone();
        }
        let title = title_case(base);
        if title.eq_ignore_ascii_case(&self.central) {
            return self.central.clone();
        }
        format!("{}{}", title, BRANCH_SUFFIX)
    }
}

fn follow_chain(raw: &HashMap<String, String>, start: &str) -> String {
    let mut current = start.to_string();
    let mut visited = vec![current.clone()];
    while let Some(next) = raw.get(&current) {
        if visited.contains(next) {
            break;
        }
        visited.push(next.clone());
        current = next.clone();
    }
    current
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop one trailing " branch" / " warehouse" word
fn strip_location_suffix(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    for suffix in STRIPPED_SUFFIXES {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            return name[..name.len() - suffix.len()].trim_end();
        }
    }
    name
}

/// Drop leading "G." / "Z. " style prefixes, keeping at least one character
fn strip_letter_prefixes(mut name: &str) -> &str {
    loop {
        let bytes = name.as_bytes();
        if bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b'.' {
            let rest = name[2..].trim_start();
            if rest.is_empty() {
                return name;
            }
            name = rest;
        } else {
            return name;
        }
    }
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = first.to_ascii_uppercase().to_string();
                    out.push_str(&chars.as_str().to_ascii_lowercase());
                    out
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn base_name(canonical: &str) -> String {
    strip_location_suffix(canonical).to_lowercase()
}

fn in_equivalence_set(set: &[String], raw_lower: &str, base: &str) -> bool {
    set.iter()
        .any(|member| base.contains(member.as_str()) || raw_lower.contains(member.as_str()))
}
