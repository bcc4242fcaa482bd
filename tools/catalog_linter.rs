/// Catalog Linter: validates a catalog file's references and value ranges.
///
/// Usage: catalog_linter <catalog.ron> [--config <config.ron>]

use curmunchkins_engine::core::budget::{is_exceeded, SensoryBudgetCaps};
use curmunchkins_engine::core::catalog::{CatalogData, CatalogStore};
use curmunchkins_engine::core::config::SessionConfig;
use curmunchkins_engine::schema::catalog::MAX_INTENSITY;
use curmunchkins_engine::schema::sensory::Axis;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: catalog_linter <catalog.ron> [--config <config.ron>]");
        process::exit(0);
    }

    let catalog_path = &args[1];
    let mut config_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            i += 1;
            config_path = Some(args[i].clone());
        }
        i += 1;
    }

    // Range checks run on the raw file; loading would repair the values
    let raw: CatalogData = match std::fs::read_to_string(Path::new(catalog_path))
        .map_err(|e| e.to_string())
        .and_then(|contents| ron::from_str::<CatalogData>(&contents).map_err(|e| e.to_string()))
    {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("ERROR: Failed to read catalog: {}", e);
            process::exit(1);
        }
    };
    let range_errors = lint_ranges(&raw);

    // Duplicate ids are load errors
    let catalog = match CatalogStore::new(raw) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: Failed to load catalog: {}", e);
            process::exit(1);
        }
    };

    let caps = match config_path {
        Some(ref path) => match SessionConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config.caps,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => SensoryBudgetCaps::default(),
    };

    println!(
        "Loaded {} munchies, {} tiggies, {} buggies, {} props, {} locations",
        catalog.munchies().len(),
        catalog.tiggies().len(),
        catalog.buggies().len(),
        catalog.props().len(),
        catalog.locations().len()
    );

    let (mut errors, warnings) = lint_catalog(&catalog, &caps);
    errors.splice(0..0, range_errors);

    println!("\n=== Catalog Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_ranges(raw: &CatalogData) -> Vec<String> {
    let mut errors = Vec::new();

    for location in &raw.locations {
        for (axis, value) in location.sensory.iter() {
            if value > MAX_INTENSITY as u32 {
                errors.push(format!(
                    "Location '{}' has {} = {} (expected 0..={})",
                    location.id,
                    axis.key(),
                    value,
                    MAX_INTENSITY
                ));
            }
        }
    }

    for buggie in &raw.buggies {
        if buggie.intensity > MAX_INTENSITY {
            errors.push(format!(
                "Buggie '{}' starts at intensity {} (maximum {})",
                buggie.id, buggie.intensity, MAX_INTENSITY
            ));
        }
    }

    errors
}

fn lint_catalog(catalog: &CatalogStore, caps: &SensoryBudgetCaps) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for location in catalog.locations() {
        // A location that breaks the caps before any props is worth knowing about
        if is_exceeded(&location.sensory, caps) {
            warnings.push(format!(
                "Location '{}' exceeds the caps with no props (total {}, caps {}/{})",
                location.id,
                location.sensory.total(),
                caps.total,
                caps.per_axis
            ));
        }
    }

    for prop in catalog.props() {
        if prop.effect.is_empty() {
            warnings.push(format!("Prop '{}' has no effects", prop.id));
        }
        for (key, _) in prop.extra_effects() {
            if key != "anxiety" {
                warnings.push(format!(
                    "Prop '{}' affects '{}', which is not a sensory axis ({})",
                    prop.id,
                    key,
                    Axis::ALL.iter().map(|a| a.key()).collect::<Vec<_>>().join(", ")
                ));
            }
        }
    }

    for tiggie in catalog.tiggies() {
        if tiggie.cue().is_none() {
            warnings.push(format!(
                "Tiggie '{}' has no tips; regulation beats will have an empty cue",
                tiggie.id
            ));
        }
    }

    for munchie in catalog.munchies() {
        for prop_id in &munchie.accessories {
            if catalog.prop(prop_id).is_none() {
                errors.push(format!(
                    "Munchie '{}' carries non-existent prop '{}'",
                    munchie.id, prop_id
                ));
            }
        }
        for buggie_id in &munchie.buggies {
            if catalog.buggie(buggie_id).is_none() {
                errors.push(format!(
                    "Munchie '{}' references non-existent buggie '{}'",
                    munchie.id, buggie_id
                ));
            }
        }
    }

    (errors, warnings)
}
