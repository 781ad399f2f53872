use crate::catalog::Catalog;
use crate::catalog::CatalogError;
use crate::catalog::FieldRecord;
use crate::catalog::StructureRecord;
use crate::error::ResultMessage;
use crate::error::WellSheetError;
use crate::metadata::extract_with;
use crate::metadata::ExtractOptions;
use crate::metadata::StructureMetadata;
use glob::MatchOptions;
use glob::Pattern;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Web path prefix of structure files.
const WEB_ROOT: &str = "/structures/";

/// Index locations tried in order, relative to the application root.
const INDEX_CANDIDATES: &[&str] = &["data/structures/index.json", "structures/index.json"];

/// Structures folder scan settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOptions {
    /// Glob patterns of structure files, matched case-insensitively against file names.
    pub file_patterns: Vec<String>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            file_patterns: vec!["*.xlsx".to_owned()],
        }
    }
}

impl CatalogOptions {
    fn patterns(&self) -> Result<Vec<Pattern>, WellSheetError> {
        Ok(self
            .file_patterns
            .iter()
            .map(|pattern| Pattern::new(pattern))
            .collect::<Result<Vec<_>, _>>()?)
    }
}

/// Sorted entries of a directory, as (name, path) pairs.
fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, WellSheetError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    entries.sort();
    Ok(entries)
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Scans a structures folder: each sub-folder is a field and each matching file in it
/// a structure. A missing folder yields an empty catalog; fields without structures
/// are left out.
pub fn scan_structures(root: &Path, options: &CatalogOptions) -> Result<Catalog, WellSheetError> {
    let patterns = options.patterns()?;
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "Structures folder not found");
        return Ok(Catalog::default());
    }

    let match_options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let mut fields = Vec::<FieldRecord>::new();
    for (folder, path) in sorted_entries(root)? {
        if !path.is_dir() {
            continue;
        }
        let field_name = capitalize(&folder);
        let mut structures = Vec::<StructureRecord>::new();
        for (file, path) in sorted_entries(&path).with_prefix(&folder)? {
            if !path.is_file() || !patterns.iter().any(|pattern| pattern.matches_with(&file, match_options)) {
                continue;
            }
            let structure_name = Path::new(&file)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.to_owned());
            structures.push(StructureRecord {
                structure_name,
                field_name: field_name.to_owned(),
                file_path: format!("{WEB_ROOT}{folder}/{file}"),
                ..Default::default()
            });
        }
        if structures.is_empty() {
            continue;
        }
        tracing::debug!(field = %field_name, structures = structures.len(), "Scanned field");
        fields.push(FieldRecord {
            field_name,
            structures_count: structures.len(),
            structures,
        });
    }

    let catalog = Catalog::from_fields(fields);
    tracing::info!(
        root = %root.display(),
        fields = catalog.total_fields,
        structures = catalog.total_structures,
        "Scanned structures folder"
    );
    Ok(catalog)
}

/// Loads the first existing `index.json` under the application root.
pub fn load_index(root: &Path) -> Result<Catalog, WellSheetError> {
    for candidate in INDEX_CANDIDATES {
        let path = root.join(candidate);
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path)?;
        let catalog = serde_json::from_str::<Catalog>(&text)
            .map_err(WellSheetError::from)
            .with_prefix(&path.display().to_string())?;
        tracing::info!(source = %path.display(), structures = catalog.total_structures, "Loaded structures index");
        return Ok(catalog);
    }
    Err(CatalogError::IndexNotFound(root.display().to_string()))?
}

/// Maps a record's web path to a file under the structures folder. Paths that would
/// leave the folder are rejected.
fn structure_path(root: &Path, file_path: &str) -> Result<PathBuf, WellSheetError> {
    let relative = file_path
        .strip_prefix(WEB_ROOT)
        .unwrap_or(file_path)
        .trim_start_matches('/');
    let relative = Path::new(relative);
    let is_plain = relative.components().all(|component| matches!(component, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !is_plain {
        Err(CatalogError::InvalidPath(file_path.to_owned()))?
    }
    Ok(root.join(relative))
}

/// Reads a structure's file from the structures folder and extracts its metadata.
pub fn extract_structure(
    root: &Path,
    record: &StructureRecord,
    options: &ExtractOptions,
) -> Result<StructureMetadata, WellSheetError> {
    let path = structure_path(root, &record.file_path)?;
    let bytes = fs::read(&path)
        .map_err(WellSheetError::from)
        .with_prefix(&record.file_path)?;
    tracing::debug!(
        field = %record.field_name,
        structure = %record.structure_name,
        path = %path.display(),
        "Extracting structure metadata"
    );
    extract_with(&bytes, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::xlsx::tests::xlsx;

    fn touch(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn capitalize_names() {
        assert_eq!(capitalize("adera"), "Adera");
        assert_eq!(capitalize("LIMAU"), "Limau");
        assert_eq!(capitalize("prabumulih barat"), "Prabumulih barat");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn scan_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("limau/KTB.xlsx"), b"");
        touch(&root.join("adera/BNG.XLSX"), b"");
        touch(&root.join("adera/ABAB.xlsx"), b"");
        touch(&root.join("adera/notes.txt"), b"");
        touch(&root.join("empty/readme.md"), b"");
        touch(&root.join("loose.xlsx"), b"");

        let catalog = scan_structures(root, &CatalogOptions::default()).unwrap();
        assert_eq!(catalog.total_fields, 2);
        assert_eq!(catalog.total_structures, 3);

        let adera = &catalog.fields[0];
        assert_eq!(adera.field_name, "Adera");
        assert_eq!(adera.structures_count, 2);
        let names: Vec<_> = adera.structures.iter().map(|it| it.structure_name.as_str()).collect();
        assert_eq!(names, vec!["ABAB", "BNG"]);
        assert_eq!(adera.structures[0].file_path, "/structures/adera/ABAB.xlsx");
        assert_eq!(adera.structures[1].file_path, "/structures/adera/BNG.XLSX");
        assert!(adera.structures[0].needs_metadata());
        assert_eq!(catalog.fields[1].field_name, "Limau");
    }

    #[test]
    fn scan_with_patterns() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("adera/ABAB.xlsx"), b"");
        touch(&tmp.path().join("adera/ABAB.ods"), b"");
        let options = CatalogOptions {
            file_patterns: vec!["*.ods".to_owned()],
        };
        let catalog = scan_structures(tmp.path(), &options).unwrap();
        assert_eq!(catalog.fields[0].structures[0].file_path, "/structures/adera/ABAB.ods");

        let invalid = CatalogOptions {
            file_patterns: vec!["[".to_owned()],
        };
        assert!(matches!(scan_structures(tmp.path(), &invalid), Err(WellSheetError::PatternError(_))));
    }

    #[test]
    fn scan_missing_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = scan_structures(&tmp.path().join("structures"), &CatalogOptions::default()).unwrap();
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn load_index_candidates() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let error = load_index(root).unwrap_err();
        assert!(matches!(error, WellSheetError::CatalogError(CatalogError::IndexNotFound(_))));

        touch(&root.join("structures/index.json"), br#"{"fields": [], "total_fields": 0, "total_structures": 0}"#);
        assert_eq!(load_index(root).unwrap().total_fields, 0);

        touch(&root.join("data/structures/index.json"), br#"{"fields": [{"field_name": "Adera", "structures_count": 0, "structures": []}], "total_fields": 1, "total_structures": 0}"#);
        assert_eq!(load_index(root).unwrap().fields[0].field_name, "Adera");
    }

    #[test]
    fn load_broken_index() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("structures/index.json"), b"{not json");
        let error = load_index(tmp.path()).unwrap_err();
        assert!(error.to_string().contains("index.json"));
    }

    #[test]
    fn structure_paths() {
        let root = Path::new("/srv/structures");
        assert_eq!(structure_path(root, "/structures/adera/ABAB.xlsx").unwrap(), root.join("adera/ABAB.xlsx"));
        assert_eq!(structure_path(root, "adera/ABAB.xlsx").unwrap(), root.join("adera/ABAB.xlsx"));
        assert!(structure_path(root, "/structures/../secret.xlsx").is_err());
        assert!(structure_path(root, "").is_err());
    }

    #[test]
    fn extract_scanned_structure() {
        let tmp = tempfile::tempdir().unwrap();
        let data = r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>45</v></c></row>"#;
        touch(&tmp.path().join("adera/ABAB.xlsx"), &xlsx(&[("Logs", data)], &["WELL", "GR", "ABAB-001"]));
        touch(&tmp.path().join("adera/BROKEN.xlsx"), b"not a workbook");

        let catalog = scan_structures(tmp.path(), &CatalogOptions::default()).unwrap();
        let structures = &catalog.fields[0].structures;
        let metadata = extract_structure(tmp.path(), &structures[0], &ExtractOptions::default()).unwrap();
        assert_eq!(metadata.wells, vec!["ABAB-001"]);

        let error = extract_structure(tmp.path(), &structures[1], &ExtractOptions::default()).unwrap_err();
        assert!(matches!(error, WellSheetError::UnreadableWorkbookError(_)));
    }
}
