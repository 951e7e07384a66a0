use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A searchable knowledge source. Declaration order is invocation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Scientific literature (PubMed)
    Pubmed,
    /// Consumer health topics (MedlinePlus)
    Medlineplus,
    /// Mayo Clinic site search
    MayoClinic,
    /// Cleveland Clinic site search
    ClevelandClinic,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Pubmed,
        Source::Medlineplus,
        Source::MayoClinic,
        Source::ClevelandClinic,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Source::Pubmed => "pubmed",
            Source::Medlineplus => "medlineplus",
            Source::MayoClinic => "mayo-clinic",
            Source::ClevelandClinic => "cleveland-clinic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Source::Pubmed => "PubMed",
            Source::Medlineplus => "MedlinePlus",
            Source::MayoClinic => "Mayo Clinic",
            Source::ClevelandClinic => "Cleveland Clinic",
        }
    }

    pub fn domain(self) -> &'static str {
        match self {
            Source::Pubmed => "pubmed.ncbi.nlm.nih.gov",
            Source::Medlineplus => "medlineplus.gov",
            Source::MayoClinic => "mayoclinic.org",
            Source::ClevelandClinic => "clevelandclinic.org",
        }
    }

    /// Maximum results this source contributes to one merged result set.
    pub fn result_cap(self) -> usize {
        match self {
            Source::Pubmed => 5,
            Source::Medlineplus | Source::MayoClinic | Source::ClevelandClinic => 3,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Which sources are enabled. Sources not mentioned are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSelection(HashMap<Source, bool>);

impl SourceSelection {
    pub fn excluding(sources: &[Source]) -> Self {
        Self(sources.iter().map(|&s| (s, false)).collect())
    }

    pub fn only(sources: &[Source]) -> Self {
        Self(
            Source::ALL
                .iter()
                .map(|&s| (s, sources.contains(&s)))
                .collect(),
        )
    }

    pub fn is_enabled(&self, source: Source) -> bool {
        self.0.get(&source).copied().unwrap_or(true)
    }

    /// Enabled sources in fixed invocation order.
    pub fn enabled(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|&s| self.is_enabled(s))
            .collect()
    }
}
