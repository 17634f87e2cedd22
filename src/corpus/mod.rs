// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The test vector corpus.
//!
//! A corpus is a directory with a `corpus.json` manifest and a pile of raw
//! binary blobs. Blobs have no header and no length prefix; the type says how
//! long they are. The manifest names the type, the blob, and the semantic value
//! for every case.
//!
//! Loading is all-or-nothing. A corpus with a dangling type reference, a
//! missing blob, or a CRC mismatch is not a corpus, and the harness refuses to
//! start rather than report half a run.
//!
//! Once loaded, a [`Corpus`] is an immutable value. The harness borrows it;
//! nothing in the crate looks vectors up through global state.

pub mod manifest;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::codec::json::value_from_json;
use crate::codec::Value;
use crate::error::HarnessError;
use crate::layout::{EnumVariant, Field, PrimitiveKind, TypeDescriptor, UnionVariant, VariantContext};

pub use manifest::{Manifest, Schema, Settings, TypeRef, VectorEntry, MANIFEST_VERSION};

/// File name of the manifest inside a corpus directory.
pub const MANIFEST_FILE: &str = "corpus.json";

/// One test case: a type, its canonical bytes, and the value they mean.
#[derive(Debug, Clone)]
pub struct TestVector {
    pub case_name: String,
    /// Type name from the manifest, or the descriptor's display form when inline.
    pub type_name: String,
    pub descriptor: Arc<TypeDescriptor>,
    pub value: Value,
    pub canonical_bytes: Vec<u8>,
    pub context: VariantContext,
    pub allow_trailing: bool,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Blob the bytes came from. Empty for vectors built in memory.
    pub source: PathBuf,
}

impl TestVector {
    pub fn new(
        case_name: impl Into<String>,
        descriptor: TypeDescriptor,
        value: Value,
        canonical_bytes: Vec<u8>,
    ) -> Self {
        Self {
            case_name: case_name.into(),
            type_name: descriptor.to_string(),
            descriptor: Arc::new(descriptor),
            value,
            canonical_bytes,
            context: VariantContext::new(),
            allow_trailing: false,
            description: None,
            tags: Vec::new(),
            source: PathBuf::new(),
        }
    }

    pub fn with_context(mut self, context: VariantContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn allowing_trailing(mut self) -> Self {
        self.allow_trailing = true;
        self
    }
}

/// A loaded, fully resolved corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub root: PathBuf,
    pub settings: Settings,
    pub types: BTreeMap<String, Arc<TypeDescriptor>>,
    pub vectors: Vec<TestVector>,
}

impl Corpus {
    /// Build an in-memory corpus. Case names must be unique.
    pub fn from_vectors(vectors: Vec<TestVector>) -> Result<Self, HarnessError> {
        let mut seen = HashSet::new();
        for vector in &vectors {
            if !seen.insert(vector.case_name.as_str()) {
                return Err(HarnessError::corpus(
                    "<memory>",
                    format!("duplicate case name '{}'", vector.case_name),
                ));
            }
        }
        Ok(Self {
            vectors,
            ..Self::default()
        })
    }

    /// Load a corpus from a directory containing `corpus.json`, or from a
    /// manifest file directly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut manifests = Vec::new();
        let mut visited = HashSet::new();
        collect_manifests(&manifest_path, &mut manifests, &mut visited)?;

        // Merge the type tables and settings, first declaration wins for settings.
        let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
        let mut settings = Settings::default();
        for (file, manifest) in &manifests {
            settings.merge_missing(&manifest.settings);
            for (name, schema) in &manifest.types {
                if schemas.insert(name.clone(), schema.clone()).is_some() {
                    return Err(HarnessError::corpus(
                        file,
                        format!("type '{}' declared more than once", name),
                    ));
                }
            }
        }

        let mut resolver = Resolver::new(&schemas);
        let mut types = BTreeMap::new();
        for name in schemas.keys() {
            let desc = resolver
                .resolve_named(name)
                .map_err(|reason| HarnessError::corpus(&manifest_path, reason))?;
            types.insert(name.clone(), desc);
        }

        let mut vectors = Vec::new();
        let mut seen = HashSet::new();
        let mut total_bytes = 0;
        for (file, manifest) in &manifests {
            let dir = file.parent().unwrap_or(Path::new("."));
            for entry in &manifest.vectors {
                if !seen.insert(entry.name.clone()) {
                    return Err(HarnessError::corpus(
                        file,
                        format!("duplicate case name '{}'", entry.name),
                    ));
                }
                let vector = load_vector(entry, dir, &mut resolver)
                    .map_err(|reason| HarnessError::corpus(file, format!("{}: {}", entry.name, reason)))?;
                total_bytes += vector.canonical_bytes.len();
                vectors.push(vector);
            }
        }

        info!(
            root = %root.display(),
            manifests = manifests.len(),
            types = types.len(),
            vectors = vectors.len(),
            bytes = total_bytes,
            "loaded corpus"
        );

        Ok(Self {
            root,
            settings,
            types,
            vectors,
        })
    }

    /// Keep only vectors whose case name starts with `prefix`.
    pub fn filter(mut self, prefix: &str) -> Self {
        self.vectors.retain(|v| v.case_name.starts_with(prefix));
        self
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestVector> {
        self.vectors.iter()
    }

    pub fn get(&self, case_name: &str) -> Option<&TestVector> {
        self.vectors.iter().find(|v| v.case_name == case_name)
    }

    /// A named type, or a primitive by its name.
    pub fn type_named(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types
            .get(name)
            .cloned()
            .or_else(|| primitive_named(name).map(|k| Arc::new(TypeDescriptor::primitive(k))))
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a TestVector;
    type IntoIter = std::slice::Iter<'a, TestVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}

fn read_manifest(path: &Path) -> Result<Manifest, HarnessError> {
    let content = fs::read_to_string(path).map_err(|e| HarnessError::corpus(path, e.to_string()))?;
    let manifest: Manifest = serde_json::from_str(&content)
        .map_err(|e| HarnessError::corpus(path, format!("invalid manifest JSON: {}", e)))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(HarnessError::corpus(
            path,
            format!(
                "unsupported manifest version {} (expected {})",
                manifest.version, MANIFEST_VERSION
            ),
        ));
    }
    Ok(manifest)
}

/// Depth-first: a manifest comes before its includes, includes in listed order.
fn collect_manifests(
    path: &Path,
    out: &mut Vec<(PathBuf, Manifest)>,
    visited: &mut HashSet<PathBuf>,
) -> Result<(), HarnessError> {
    let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(key) {
        return Err(HarnessError::corpus(path, "manifest included more than once"));
    }

    let manifest = read_manifest(path)?;
    debug!(manifest = %path.display(), vectors = manifest.vectors.len(), "read manifest");
    let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let includes = manifest.include.clone();
    out.push((path.to_path_buf(), manifest));

    for include in includes {
        collect_manifests(&dir.join(include), out, visited)?;
    }
    Ok(())
}

fn primitive_named(name: &str) -> Option<PrimitiveKind> {
    PrimitiveKind::ALL.into_iter().find(|k| k.name() == name)
}

/// Resolves `{"ref": ..}` schemas against the merged type table.
struct Resolver<'a> {
    schemas: &'a BTreeMap<String, Schema>,
    resolved: HashMap<String, Arc<TypeDescriptor>>,
    /// Names currently being resolved, for cycle detection.
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(schemas: &'a BTreeMap<String, Schema>) -> Self {
        Self {
            schemas,
            resolved: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn resolve_named(&mut self, name: &str) -> Result<Arc<TypeDescriptor>, String> {
        if let Some(desc) = self.resolved.get(name) {
            return Ok(Arc::clone(desc));
        }
        let schemas = self.schemas;
        let Some(schema) = schemas.get(name) else {
            return primitive_named(name)
                .map(|k| Arc::new(TypeDescriptor::primitive(k)))
                .ok_or_else(|| format!("unknown type '{}'", name));
        };
        if self.stack.iter().any(|n| n == name) {
            return Err(format!(
                "recursive type: {} -> {}",
                self.stack.join(" -> "),
                name
            ));
        }

        self.stack.push(name.to_string());
        let result = self.resolve(schema);
        self.stack.pop();

        let desc = result?;
        desc.validate()
            .map_err(|e| format!("type '{}' is invalid: {}", name, e))?;
        let desc = Arc::new(desc);
        self.resolved.insert(name.to_string(), Arc::clone(&desc));
        Ok(desc)
    }

    fn resolve_ref(&mut self, ty: &TypeRef) -> Result<(String, Arc<TypeDescriptor>), String> {
        match ty {
            TypeRef::Name(name) => Ok((name.clone(), self.resolve_named(name)?)),
            TypeRef::Inline(schema) => {
                let desc = self.resolve(schema)?;
                desc.validate().map_err(|e| e.to_string())?;
                Ok((desc.to_string(), Arc::new(desc)))
            }
        }
    }

    fn resolve(&mut self, schema: &Schema) -> Result<TypeDescriptor, String> {
        Ok(match schema {
            Schema::Ref(name) => (*self.resolve_named(name)?).clone(),
            Schema::Primitive(kind) => TypeDescriptor::Primitive(*kind),
            Schema::FixedArray { elem, count } => TypeDescriptor::FixedArray {
                elem: Box::new(self.resolve(elem)?),
                count: *count,
            },
            Schema::Struct { fields } => TypeDescriptor::Struct {
                fields: fields
                    .iter()
                    .map(|f| {
                        Ok(Field {
                            name: f.name.clone(),
                            ty: self.resolve(&f.ty)?,
                        })
                    })
                    .collect::<Result<_, String>>()?,
            },
            Schema::Enum { variants } => TypeDescriptor::Enum {
                variants: variants
                    .iter()
                    .map(|v| {
                        Ok(EnumVariant {
                            name: v.name.clone(),
                            tag: v.tag,
                            payload: v.payload.as_ref().map(|p| self.resolve(p)).transpose()?,
                        })
                    })
                    .collect::<Result<_, String>>()?,
            },
            Schema::Union { variants } => TypeDescriptor::Union {
                variants: variants
                    .iter()
                    .map(|v| {
                        Ok(UnionVariant {
                            name: v.name.clone(),
                            ty: self.resolve(&v.ty)?,
                        })
                    })
                    .collect::<Result<_, String>>()?,
            },
        })
    }
}

fn parse_crc(text: &str) -> Result<u32, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|_| format!("crc32 '{}' is not hex", text))
}

fn load_vector(entry: &VectorEntry, dir: &Path, resolver: &mut Resolver<'_>) -> Result<TestVector, String> {
    let (type_name, descriptor) = resolver.resolve_ref(&entry.ty)?;

    let source = dir.join(&entry.binary);
    let canonical_bytes =
        fs::read(&source).map_err(|e| format!("cannot read {}: {}", source.display(), e))?;

    if let Some(expected) = &entry.crc32 {
        let expected = parse_crc(expected)?;
        let actual = crc32fast::hash(&canonical_bytes);
        if actual != expected {
            return Err(format!(
                "crc32 mismatch for {}: manifest says {:08x}, blob is {:08x}",
                source.display(),
                expected,
                actual
            ));
        }
    }

    let mut context: VariantContext = entry.variants.iter().map(|(p, v)| (p.as_str(), v.as_str())).collect();
    if let Some(active) = &entry.active_variant {
        if let Some(existing) = context.get("") {
            if existing != active.as_str() {
                return Err(format!(
                    "active_variant '{}' conflicts with variants[\"\"] = '{}'",
                    active, existing
                ));
            }
        }
        context.insert("", active.as_str());
    }

    let value = value_from_json(&descriptor, &entry.value, &context).map_err(|e| format!("value: {}", e))?;

    Ok(TestVector {
        case_name: entry.name.clone(),
        type_name,
        descriptor,
        value,
        canonical_bytes,
        context,
        allow_trailing: entry.allow_trailing,
        description: entry.description.clone(),
        tags: entry.tags.clone(),
        source,
    })
}
