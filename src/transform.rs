// plans10x/src/transform.rs

//! The per-plan edits: macro renaming, patch-list normalization and
//! augmentation, and identifier/name rewriting.
//!
//! The four edits are independent; [`transform_plan`] applies all of
//! them to one plan record and [`transform_document`] runs them over
//! every plan a document contains. Rule tables (module prefixes, the
//! DLC patch mappings) are declarative data so new entries are
//! additions, not logic changes.

use crate::plan::PlanSet;
use crate::xml::{Document, Value};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

/// Prefix applied to rewritten macros and carried by the base patch.
const MACRO_PREFIX: &str = "10x_modules_";

/// Display-name prefix (note the trailing space).
const NAME_PREFIX: &str = "10X ";

/// Macro prefixes that mark generic station modules.
const MODULE_PREFIXES: [&str; 2] = ["storage_", "hab_"];

lazy_static! {
    /// Production macros: `prod_<anything>_macro`, anchored, non-empty.
    static ref PROD_MACRO: Regex = Regex::new(r"^prod_(.+)_macro$").expect("valid regex");
}

/// A patch record to be injected into a plan's patch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSpec {
    pub extension: &'static str,
    pub version: &'static str,
    pub name: &'static str,
}

impl PatchSpec {
    fn to_value(self) -> Value {
        let mut patch = Value::node();
        patch.set_attr("extension", self.extension);
        patch.set_attr("version", self.version);
        patch.set_attr("name", self.name);
        patch
    }
}

/// The base extension patch every converted plan depends on.
pub const BASE_PATCH: PatchSpec = PatchSpec {
    extension: "10x_modules",
    version: "112",
    name: "10x_modules",
};

/// One DLC dependency rule: if any trigger extension is already present
/// in a plan's patch list, the derived patch is injected.
#[derive(Debug, Clone, Copy)]
pub struct DlcMapping {
    /// Accepted spellings of the triggering DLC extension.
    pub triggers: [&'static str; 2],
    /// The derived patch to inject.
    pub patch: PatchSpec,
}

const fn dlc(long: &'static str, short: &'static str, derived: &'static str) -> DlcMapping {
    DlcMapping {
        triggers: [long, short],
        patch: PatchSpec {
            extension: derived,
            version: "101",
            name: derived,
        },
    }
}

/// DLC extension → derived patch table, checked in order.
pub const DLC_PATCHES: [DlcMapping; 5] = [
    dlc("ego_dlc_boron", "dlc_boron", "z10x_modules_boron"),
    dlc("ego_dlc_split", "dlc_split", "z10x_modules_split"),
    dlc("ego_dlc_terran", "dlc_terran", "z10x_modules_terran"),
    dlc("ego_dlc_pirate", "dlc_pirate", "z10x_modules_pirate"),
    dlc("ego_dlc_timelines", "dlc_timelines", "z10x_modules_timelines"),
];

/// Apply all edits to every plan in the document and write them back.
pub fn transform_document<R: Rng>(doc: &mut Document, rng: &mut R) {
    let mut plans = PlanSet::locate(doc);
    for plan in plans.iter_mut() {
        transform_plan(plan, rng);
    }
    plans.commit(doc);
}

/// Apply the four independent edits to one plan record.
pub fn transform_plan<R: Rng>(plan: &mut Value, rng: &mut R) {
    rewrite_entry_macros(plan);
    if let Some(patches) = patch_list(plan) {
        augment_patches(patches);
    }
    rewrite_identity(plan, rng);
}

/// Rewrite a single macro name, or `None` when no rule matches.
///
/// Rules in order, first match wins:
/// 1. `prod_<x>_macro` loses its `_macro` suffix and gains the
///    `10x_modules_` prefix.
/// 2. A module-prefixed macro (`storage_`, `hab_`) that is not already
///    converted gains the `10x_modules_` prefix unchanged.
pub fn rewrite_macro(value: &str) -> Option<String> {
    if let Some(caps) = PROD_MACRO.captures(value) {
        return Some(format!("{}prod_{}", MACRO_PREFIX, &caps[1]));
    }
    if !value.starts_with(MACRO_PREFIX)
        && MODULE_PREFIXES.iter().any(|p| value.starts_with(p))
    {
        return Some(format!("{}{}", MACRO_PREFIX, value));
    }
    None
}

/// Rewrite the `macro` attribute of every entry in the plan.
///
/// Entries may be absent, a single record, or a list; entries without a
/// `macro` attribute are skipped.
fn rewrite_entry_macros(plan: &mut Value) {
    let entries = match plan.as_map_mut().and_then(|map| map.get_mut("entry")) {
        Some(entries) => entries,
        None => return,
    };
    match entries {
        Value::List(items) => {
            for item in items {
                rewrite_entry(item);
            }
        }
        single => rewrite_entry(single),
    }
}

fn rewrite_entry(entry: &mut Value) {
    let renamed = entry.attr("macro").and_then(rewrite_macro);
    if let Some(renamed) = renamed {
        log::debug!("macro {} -> {}", entry.attr("macro").unwrap_or(""), renamed);
        entry.set_attr("macro", renamed);
    }
}

/// Normalize the plan's patch container and return its patch list.
///
/// The legacy misspelled `patchs` container is renamed to `patches`
/// when the canonical one is absent; the container and its `patch` list
/// are materialized if missing, and a single patch record is coerced to
/// a one-element list. The returned list aliases the plan's storage, so
/// mutations stick. `None` only for non-element plan values.
pub fn patch_list(plan: &mut Value) -> Option<&mut Vec<Value>> {
    let map = plan.as_map_mut()?;

    if !map.contains_key("patches") {
        if let Some(legacy) = map.remove("patchs") {
            map.insert("patches".to_string(), legacy);
        }
    }
    match map.get("patches") {
        Some(Value::Node(_)) => {}
        _ => {
            map.insert("patches".to_string(), Value::node());
        }
    }

    let container = map.get_mut("patches").and_then(Value::as_map_mut)?;
    let items = match container.remove("patch") {
        None => Vec::new(),
        Some(Value::List(items)) => items,
        Some(single) => vec![single],
    };
    container.insert("patch".to_string(), Value::List(items));
    match container.get_mut("patch") {
        Some(Value::List(items)) => Some(items),
        _ => None,
    }
}

/// Inject the base patch and any triggered DLC patches.
///
/// Insertion is append-only and keyed on `extension`: a record whose
/// extension is already present is never added again, so running the
/// augmenter twice changes nothing. Each DLC check reads the current
/// list state, including records appended by earlier mappings.
pub fn augment_patches(patches: &mut Vec<Value>) {
    if !has_extension(patches, BASE_PATCH.extension) {
        patches.push(BASE_PATCH.to_value());
    }
    for mapping in &DLC_PATCHES {
        let triggered = mapping
            .triggers
            .iter()
            .any(|t| has_extension(patches, t));
        if triggered && !has_extension(patches, mapping.patch.extension) {
            log::debug!("injecting dependency patch {}", mapping.patch.extension);
            patches.push(mapping.patch.to_value());
        }
    }
}

fn has_extension(patches: &[Value], extension: &str) -> bool {
    patches.iter().any(|p| p.attr("extension") == Some(extension))
}

/// Overwrite the plan's `id` with a fresh random one and prefix its
/// display name.
///
/// Ids have the form `player_<D>` with `D` drawn uniformly from the
/// 12-digit range; there is no uniqueness guarantee across plans. Names
/// already carrying the `10X ` prefix are left alone; absent or empty
/// names become exactly `10X`.
pub fn rewrite_identity<R: Rng>(plan: &mut Value, rng: &mut R) {
    let id = rng.gen_range(100_000_000_000u64..=999_999_999_999);
    plan.set_attr("id", format!("player_{}", id));

    let name = match plan.attr("name") {
        Some(current) if current.starts_with(NAME_PREFIX) => None,
        Some(current) if !current.is_empty() => Some(format!("{}{}", NAME_PREFIX, current)),
        _ => Some(NAME_PREFIX.trim_end().to_string()),
    };
    if let Some(name) = name {
        plan.set_attr("name", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_rewrite_macro_prod_rule() {
        assert_eq!(
            rewrite_macro("prod_engine_macro").as_deref(),
            Some("10x_modules_prod_engine")
        );
        assert_eq!(
            rewrite_macro("prod_solarpanel_macro").as_deref(),
            Some("10x_modules_prod_solarpanel")
        );
    }

    #[test]
    fn test_rewrite_macro_module_prefix_rule() {
        assert_eq!(
            rewrite_macro("storage_container_l").as_deref(),
            Some("10x_modules_storage_container_l")
        );
        assert_eq!(
            rewrite_macro("hab_basic").as_deref(),
            Some("10x_modules_hab_basic")
        );
    }

    #[test]
    fn test_rewrite_macro_leaves_nonmatching_alone() {
        assert_eq!(rewrite_macro("weapon_turret_macro"), None);
        assert_eq!(rewrite_macro("10x_modules_storage_container_l"), None);
        assert_eq!(rewrite_macro(""), None);
        // Pattern is anchored: the inner part must be non-empty.
        assert_eq!(rewrite_macro("prod__macro"), None);
    }

    #[test]
    fn test_entry_macros_single_and_list() {
        let mut doc =
            parse(r#"<plan><entry macro="prod_turret_macro"/></plan>"#).unwrap();
        let plan = doc.root.as_map_mut().unwrap().get_mut("plan").unwrap();
        rewrite_entry_macros(plan);
        assert_eq!(
            plan.get("entry").unwrap().attr("macro"),
            Some("10x_modules_prod_turret")
        );

        let mut doc = parse(
            r#"<plan><entry macro="storage_s"/><entry index="2"/><entry macro="dock_area"/></plan>"#,
        )
        .unwrap();
        let plan = doc.root.as_map_mut().unwrap().get_mut("plan").unwrap();
        rewrite_entry_macros(plan);
        match plan.get("entry") {
            Some(Value::List(items)) => {
                assert_eq!(items[0].attr("macro"), Some("10x_modules_storage_s"));
                // No macro attribute at all: skipped.
                assert_eq!(items[1].attr("macro"), None);
                // No rule matches: untouched.
                assert_eq!(items[2].attr("macro"), Some("dock_area"));
            }
            other => panic!("expected entry list, got {:?}", other),
        }
    }

    #[test]
    fn test_patch_list_renames_legacy_container() {
        let mut doc =
            parse(r#"<plan><patchs><patch extension="e" version="1" name="n"/></patchs></plan>"#)
                .unwrap();
        let plan = doc.root.as_map_mut().unwrap().get_mut("plan").unwrap();
        let patches = patch_list(plan).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].attr("extension"), Some("e"));

        assert!(plan.get("patchs").is_none());
        assert!(plan.get("patches").is_some());
    }

    #[test]
    fn test_patch_list_materializes_missing_container() {
        let mut doc = parse("<plan/>").unwrap();
        let plan = doc.root.as_map_mut().unwrap().get_mut("plan").unwrap();
        let patches = patch_list(plan).unwrap();
        assert!(patches.is_empty());
    }

    #[test]
    fn test_patch_list_mutations_stick() {
        let mut doc = parse("<plan/>").unwrap();
        let plan = doc.root.as_map_mut().unwrap().get_mut("plan").unwrap();
        patch_list(plan).unwrap().push(BASE_PATCH.to_value());

        let stored = plan.get("patches").and_then(|c| c.get("patch")).unwrap();
        match stored {
            Value::List(items) => assert_eq!(items[0].attr("extension"), Some("10x_modules")),
            other => panic!("expected patch list, got {:?}", other),
        }
    }

    #[test]
    fn test_augment_adds_base_patch_once() {
        let mut patches = Vec::new();
        augment_patches(&mut patches);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].attr("extension"), Some("10x_modules"));
        assert_eq!(patches[0].attr("version"), Some("112"));

        // Idempotent: a second run changes nothing.
        augment_patches(&mut patches);
        assert_eq!(patches.len(), 1);
    }

    #[test]
    fn test_augment_injects_triggered_dlc_patch() {
        let mut patch = Value::node();
        patch.set_attr("extension", "ego_dlc_boron");
        patch.set_attr("version", "1");
        patch.set_attr("name", "Kingdom End");
        let mut patches = vec![patch];

        augment_patches(&mut patches);
        assert_eq!(patches.len(), 3);
        assert_eq!(patches[1].attr("extension"), Some("10x_modules"));
        assert_eq!(patches[2].attr("extension"), Some("z10x_modules_boron"));
        assert_eq!(patches[2].attr("version"), Some("101"));
        assert_eq!(patches[2].attr("name"), Some("z10x_modules_boron"));
    }

    #[test]
    fn test_augment_accepts_short_trigger_spelling() {
        let mut patch = Value::node();
        patch.set_attr("extension", "dlc_split");
        let mut patches = vec![patch];

        augment_patches(&mut patches);
        assert!(has_extension(&patches, "z10x_modules_split"));
    }

    #[test]
    fn test_augment_without_dlc_adds_no_derived_patches() {
        let mut patches = Vec::new();
        augment_patches(&mut patches);
        for mapping in &DLC_PATCHES {
            assert!(!has_extension(&patches, mapping.patch.extension));
        }
    }

    #[test]
    fn test_augment_never_duplicates_derived_patch() {
        let mut trigger = Value::node();
        trigger.set_attr("extension", "ego_dlc_terran");
        let mut patches = vec![trigger];
        augment_patches(&mut patches);
        let len = patches.len();
        augment_patches(&mut patches);
        assert_eq!(patches.len(), len);
    }

    #[test]
    fn test_identity_id_format() {
        let mut rng = rng();
        for _ in 0..100 {
            let mut plan = Value::node();
            rewrite_identity(&mut plan, &mut rng);
            let id = plan.attr("id").unwrap();
            let digits = id.strip_prefix("player_").unwrap();
            assert_eq!(digits.len(), 12);
            let value: u64 = digits.parse().unwrap();
            assert!((100_000_000_000..=999_999_999_999).contains(&value));
        }
    }

    #[test]
    fn test_identity_name_prefixing() {
        let mut rng = rng();

        let mut plan = Value::node();
        plan.set_attr("name", "My Station");
        rewrite_identity(&mut plan, &mut rng);
        assert_eq!(plan.attr("name"), Some("10X My Station"));

        let mut plan = Value::node();
        plan.set_attr("name", "10X Already");
        rewrite_identity(&mut plan, &mut rng);
        assert_eq!(plan.attr("name"), Some("10X Already"));

        let mut plan = Value::node();
        plan.set_attr("name", "");
        rewrite_identity(&mut plan, &mut rng);
        assert_eq!(plan.attr("name"), Some("10X"));

        let mut plan = Value::node();
        rewrite_identity(&mut plan, &mut rng);
        assert_eq!(plan.attr("name"), Some("10X"));
    }

    #[test]
    fn test_transform_document_single_plan() {
        let mut doc = parse(
            r#"<plans>
                 <plan id="old" name="Base">
                   <entry macro="prod_turret_macro"/>
                   <patches>
                     <patch extension="ego_dlc_split" version="1" name="Split Vendetta"/>
                   </patches>
                 </plan>
               </plans>"#,
        )
        .unwrap();
        transform_document(&mut doc, &mut rng());

        let plan = doc.root.get("plans").and_then(|p| p.get("plan")).unwrap();
        assert!(matches!(plan, Value::Node(_)));
        assert_eq!(plan.attr("name"), Some("10X Base"));
        assert!(plan.attr("id").unwrap().starts_with("player_"));
        assert_eq!(
            plan.get("entry").unwrap().attr("macro"),
            Some("10x_modules_prod_turret")
        );

        match plan.get("patches").and_then(|c| c.get("patch")) {
            Some(Value::List(items)) => {
                let extensions: Vec<_> =
                    items.iter().filter_map(|p| p.attr("extension")).collect();
                assert_eq!(
                    extensions,
                    vec!["ego_dlc_split", "10x_modules", "z10x_modules_split"]
                );
            }
            other => panic!("expected patch list, got {:?}", other),
        }
    }
}
