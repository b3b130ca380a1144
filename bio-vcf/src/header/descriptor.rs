//! Dictionary entry types held by [`super::Header`] (spec §3, §4.D).

use bio_value::TypeId;

/// VCF `Number=` attribute: either a fixed count or one of the
/// record-dependent symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    /// A fixed, known count (`Number=0` for flags, `Number=3`, ...).
    Count(u32),
    /// One value per alternate allele.
    AltAlleles,
    /// One value per allele including the reference.
    AllAlleles,
    /// One value per possible genotype.
    Genotypes,
    /// Unknown/variable count (`Number=.`).
    Unknown,
}

impl Number {
    /// Whether this `Number` implies a vector-typed value (anything other
    /// than exactly one scalar value).
    #[must_use]
    pub const fn is_vector(self) -> bool {
        !matches!(self, Number::Count(1))
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "A" => Number::AltAlleles,
            "R" => Number::AllAlleles,
            "G" => Number::Genotypes,
            "." => Number::Unknown,
            n => n.parse().map_or(Number::Unknown, Number::Count),
        }
    }

    pub(crate) fn render(self) -> String {
        match self {
            Number::Count(n) => n.to_string(),
            Number::AltAlleles => "A".to_string(),
            Number::AllAlleles => "R".to_string(),
            Number::Genotypes => "G".to_string(),
            Number::Unknown => ".".to_string(),
        }
    }
}

/// VCF `Type=` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcfType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

impl VcfType {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "Integer" => VcfType::Integer,
            "Float" => VcfType::Float,
            "Flag" => VcfType::Flag,
            "Character" => VcfType::Character,
            "String" => VcfType::String,
            _ => return None,
        })
    }

    pub(crate) fn render(self) -> &'static str {
        match self {
            VcfType::Integer => "Integer",
            VcfType::Float => "Float",
            VcfType::Flag => "Flag",
            VcfType::Character => "Character",
            VcfType::String => "String",
        }
    }

    /// The [`TypeId`] a value declared with `(number, self)` is parsed
    /// into. Grounded on the `type_enum` doc comments in
    /// `original_source/include/bio/io/var/misc.hpp`: `Character` with
    /// `Number!=1` collapses to a single `String`, not a vector — VCF uses
    /// that combination for multi-character single tokens, not arrays.
    #[must_use]
    pub fn value_type_id(self, number: Number) -> TypeId {
        let vector = number.is_vector();
        match self {
            VcfType::Integer => {
                if vector {
                    TypeId::VectorInt32
                } else {
                    TypeId::Int32
                }
            }
            VcfType::Float => {
                if vector {
                    TypeId::VectorFloat32
                } else {
                    TypeId::Float32
                }
            }
            VcfType::Flag => TypeId::Flag,
            VcfType::Character => {
                if vector {
                    TypeId::String
                } else {
                    TypeId::Char
                }
            }
            VcfType::String => {
                if vector {
                    TypeId::VectorString
                } else {
                    TypeId::String
                }
            }
        }
    }
}

/// A structured `##INFO=<...>` or `##FORMAT=<...>` dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub id: String,
    pub number: Number,
    pub ty: VcfType,
    pub description: String,
    /// Any other `key=value` attributes present on the line (e.g. `Source`,
    /// `Version`), preserved for round-tripping but not interpreted.
    pub extra: Vec<(String, String)>,
    /// The BCF-stable numeric id for this entry.
    pub idx: u32,
}

impl FieldDescriptor {
    /// The [`TypeId`] values of this field parse into.
    #[must_use]
    pub fn value_type_id(&self) -> TypeId {
        self.ty.value_type_id(self.number)
    }
}

/// A structured `##FILTER=<...>` dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    pub id: String,
    pub description: String,
    pub idx: u32,
}

/// A structured `##contig=<...>` dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ContigDescriptor {
    pub id: String,
    pub length: Option<u64>,
    /// Other attributes besides `ID`/`length` (e.g. `assembly`, `md5`), in
    /// source order.
    pub extra: Vec<(String, String)>,
    pub idx: u32,
}
