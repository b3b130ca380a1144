//! Variant header: VCF textual meta lines parsed into ID↔index dictionaries
//! for INFO/FORMAT/FILTER/contig (spec §3, §4.D).

mod descriptor;
mod parse;
mod quote_split;
mod write;

pub use descriptor::{ContigDescriptor, FieldDescriptor, FilterDescriptor, Number, VcfType};

use std::collections::HashMap;

/// Which dictionary an id/idx belongs to, used by lookup and mutation
/// helpers shared across INFO/FORMAT/FILTER/contig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictKind {
    Info,
    Format,
    Filter,
    Contig,
}

/// The parsed VCF/BCF header: ordered dictionaries plus the bidirectional
/// id↔position and idx↔position maps that make record interpretation
/// O(1).
///
/// Invariants (spec §4.D): every id appears in at most one dictionary of
/// its kind, the forward map is total, every entry has a unique and
/// permanently-assigned `idx`, and both maps are unconditionally rebuilt
/// after any mutation (the Open Question in spec §9 about eager-but-stale
/// `rname_to_pos`-style maps is resolved in favor of always rebuilding).
#[derive(Debug, Clone, Default)]
pub struct Header {
    /// Free-form `##key=value` meta lines that aren't one of the four
    /// structured dictionary kinds, in source order.
    pub meta: Vec<(String, String)>,
    pub info: Vec<FieldDescriptor>,
    pub format: Vec<FieldDescriptor>,
    pub filter: Vec<FilterDescriptor>,
    pub contig: Vec<ContigDescriptor>,
    /// Sample names, in `#CHROM` column order.
    pub samples: Vec<String>,

    info_by_id: HashMap<String, usize>,
    info_by_idx: HashMap<u32, usize>,
    format_by_id: HashMap<String, usize>,
    format_by_idx: HashMap<u32, usize>,
    filter_by_id: HashMap<String, usize>,
    filter_by_idx: HashMap<u32, usize>,
    contig_by_id: HashMap<String, usize>,
    contig_by_idx: HashMap<u32, usize>,
}

impl Header {
    /// An empty header with no dictionaries, no samples, and no meta lines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every forward (id→position) and reverse (idx→position) map
    /// from the current dictionary contents. Called after every mutation,
    /// never incrementally patched (spec §9).
    pub fn rebuild_maps(&mut self) {
        self.info_by_id = index_by(|i| &self.info[i].id, self.info.len());
        self.info_by_idx = index_by_idx(|i| self.info[i].idx, self.info.len());
        self.format_by_id = index_by(|i| &self.format[i].id, self.format.len());
        self.format_by_idx = index_by_idx(|i| self.format[i].idx, self.format.len());
        self.filter_by_id = index_by(|i| &self.filter[i].id, self.filter.len());
        self.filter_by_idx = index_by_idx(|i| self.filter[i].idx, self.filter.len());
        self.contig_by_id = index_by(|i| &self.contig[i].id, self.contig.len());
        self.contig_by_idx = index_by_idx(|i| self.contig[i].idx, self.contig.len());
    }

    /// INFO descriptor by string id, O(1).
    #[must_use]
    pub fn info_by_id(&self, id: &str) -> Option<&FieldDescriptor> {
        self.info_by_id.get(id).map(|&i| &self.info[i])
    }

    /// INFO descriptor by BCF-stable numeric idx, O(1).
    #[must_use]
    pub fn info_by_idx(&self, idx: u32) -> Option<&FieldDescriptor> {
        self.info_by_idx.get(&idx).map(|&i| &self.info[i])
    }

    /// FORMAT descriptor by string id, O(1).
    #[must_use]
    pub fn format_by_id(&self, id: &str) -> Option<&FieldDescriptor> {
        self.format_by_id.get(id).map(|&i| &self.format[i])
    }

    /// FORMAT descriptor by BCF-stable numeric idx, O(1).
    #[must_use]
    pub fn format_by_idx(&self, idx: u32) -> Option<&FieldDescriptor> {
        self.format_by_idx.get(&idx).map(|&i| &self.format[i])
    }

    /// FILTER descriptor by string id, O(1).
    #[must_use]
    pub fn filter_by_id(&self, id: &str) -> Option<&FilterDescriptor> {
        self.filter_by_id.get(id).map(|&i| &self.filter[i])
    }

    /// FILTER descriptor by BCF-stable numeric idx, O(1).
    #[must_use]
    pub fn filter_by_idx(&self, idx: u32) -> Option<&FilterDescriptor> {
        self.filter_by_idx.get(&idx).map(|&i| &self.filter[i])
    }

    /// Contig descriptor by name, O(1).
    #[must_use]
    pub fn contig_by_id(&self, id: &str) -> Option<&ContigDescriptor> {
        self.contig_by_id.get(id).map(|&i| &self.contig[i])
    }

    /// Contig descriptor by BCF-stable numeric idx, O(1).
    #[must_use]
    pub fn contig_by_idx(&self, idx: u32) -> Option<&ContigDescriptor> {
        self.contig_by_idx.get(&idx).map(|&i| &self.contig[i])
    }

    /// Append a contig to the dictionary, assigning `idx = max(existing) +
    /// 1`, and rebuild both maps.
    pub fn push_contig(&mut self, name: impl Into<String>, length: Option<u64>, extra: Vec<(String, String)>) {
        let idx = self.contig.iter().map(|c| c.idx).max().map_or(0, |m| m + 1);
        self.contig.push(ContigDescriptor {
            id: name.into(),
            length,
            extra,
            idx,
        });
        self.rebuild_maps();
    }

    /// For every id in `referenced` not already present in the named
    /// dictionary, append a placeholder descriptor (generic `String`/`.`
    /// typed for INFO/FORMAT, length-less for contig) and log a warning,
    /// per spec §4.D's "inject a synthetic entry" contract.
    pub fn add_missing(&mut self, kind: DictKind, referenced: &[String]) {
        let mut changed = false;
        for id in referenced {
            let present = match kind {
                DictKind::Info => self.info_by_id.contains_key(id),
                DictKind::Format => self.format_by_id.contains_key(id),
                DictKind::Filter => self.filter_by_id.contains_key(id),
                DictKind::Contig => self.contig_by_id.contains_key(id),
            };
            if present {
                continue;
            }
            tracing::warn!(id = %id, kind = ?kind, "header missing referenced id; injecting placeholder");
            match kind {
                DictKind::Info => {
                    let idx = self.info.iter().map(|d| d.idx).max().map_or(0, |m| m + 1);
                    self.info.push(FieldDescriptor {
                        id: id.clone(),
                        number: Number::Unknown,
                        ty: VcfType::String,
                        description: "(auto-generated placeholder)".to_string(),
                        extra: Vec::new(),
                        idx,
                    });
                }
                DictKind::Format => {
                    let idx = self.format.iter().map(|d| d.idx).max().map_or(0, |m| m + 1);
                    self.format.push(FieldDescriptor {
                        id: id.clone(),
                        number: Number::Unknown,
                        ty: VcfType::String,
                        description: "(auto-generated placeholder)".to_string(),
                        extra: Vec::new(),
                        idx,
                    });
                }
                DictKind::Filter => {
                    let idx = self.filter.iter().map(|d| d.idx).max().map_or(0, |m| m + 1);
                    self.filter.push(FilterDescriptor {
                        id: id.clone(),
                        description: "(auto-generated placeholder)".to_string(),
                        idx,
                    });
                }
                DictKind::Contig => {
                    self.push_contig(id.clone(), None, Vec::new());
                    continue; // push_contig already rebuilt maps
                }
            }
            changed = true;
        }
        if changed {
            self.rebuild_maps();
        }
    }
}

fn index_by<'a>(id_at: impl Fn(usize) -> &'a String, len: usize) -> HashMap<String, usize> {
    (0..len).map(|i| (id_at(i).clone(), i)).collect()
}

fn index_by_idx(idx_at: impl Fn(usize) -> u32, len: usize) -> HashMap<u32, usize> {
    (0..len).map(|i| (idx_at(i), i)).collect()
}
