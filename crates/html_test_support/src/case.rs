use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const TREE_CONSTRUCTION_FORMAT_V1: &str = "html5-tree-construction-v1";

/// One tree-construction fixture entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub data: String,
    #[serde(rename = "document-fragment", default)]
    pub fragment_context: Option<String>,
    pub document: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl TestCase {
    pub fn is_fragment(&self) -> bool {
        self.fragment_context.is_some()
    }
}

/// Cases of one fixture file, in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corpus {
    pub name: String,
    pub path: PathBuf,
    pub cases: Vec<TestCase>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CorpusFile {
    format: String,
    #[serde(default)]
    cases: Vec<TestCase>,
}

pub fn load_corpus(path: &Path) -> Corpus {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read tree-construction corpus {path:?}: {err}"));
    parse_corpus(&content, path)
}

/// Loads every `*.toml` corpus under `root`, sorted by file name.
pub fn load_corpus_dir(root: &Path) -> Vec<Corpus> {
    let entries = fs::read_dir(root)
        .unwrap_or_else(|err| panic!("failed to read corpus directory {root:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .map(|entry| {
            entry
                .unwrap_or_else(|err| panic!("failed to read entry in {root:?}: {err}"))
                .path()
        })
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    paths.iter().map(|path| load_corpus(path)).collect()
}

pub fn parse_corpus(content: &str, path: &Path) -> Corpus {
    let file: CorpusFile = toml::from_str(content)
        .unwrap_or_else(|err| panic!("invalid tree-construction corpus {path:?}: {err}"));
    assert_eq!(
        file.format, TREE_CONSTRUCTION_FORMAT_V1,
        "unsupported format in {path:?}"
    );
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_else(|| panic!("corpus path {path:?} has no usable file stem"))
        .to_string();
    let cases = file
        .cases
        .into_iter()
        .map(|mut case| {
            // Multi-line TOML strings end with the newline before the closing quotes.
            if case.document.ends_with('\n') {
                case.document.pop();
            }
            case
        })
        .collect();
    Corpus {
        name,
        path: path.to_path_buf(),
        cases,
    }
}
