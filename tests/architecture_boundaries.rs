use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

#[test]
fn sunburst_module_is_pure() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/sunburst");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for forbidden in ["crate::system", "crate::chart", "sysinfo", "tokio", "std::fs"] {
            if content.contains(forbidden) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    forbidden
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Sunburst layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn sysinfo_is_confined_to_collector() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        let rel_path = rel(&file);
        if content.contains("sysinfo::") && rel_path != "src/system/collector.rs" {
            violations.push(format!("{} uses `sysinfo` directly", rel_path));
        }
    }

    assert!(
        violations.is_empty(),
        "OS access outside the collector:\n{}",
        violations.join("\n")
    );
}

#[test]
fn target_os_cfg_is_not_used() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        if content.contains("target_os") {
            violations.push(rel(&file));
        }
    }

    assert!(
        violations.is_empty(),
        "Platform-specific cfg found; OS differences belong to sysinfo:\n{}",
        violations.join("\n")
    );
}
