//! Search Module
//!
//! Biomedical literature search against NCBI services:
//! - E-utilities `esearch` / `esummary` over the PubMed Central database
//! - BioC XML full-text retrieval for open-access PMC articles

pub mod pubmed;

pub use pubmed::{
    build_term_query, pmc_id_from_url, ArticleSummary, FullArticleResult, PubMedClient, PubMedError,
};
