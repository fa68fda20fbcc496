pub mod apple_docs;
mod cache;
pub mod config;
pub mod error;
pub mod evolution;
pub mod hig;
pub mod local_docs;
pub mod repos;
pub mod suggestions;
mod urlenc;
pub mod wwdc;

pub use apple_docs::{
    AppleDocsClient, DOC_BASE_URL, FrameworkInfo, OnlineSearch, OnlineSearchUrls,
    ParsedDocumentation,
};
pub use config::{DOC_PATH_ENV, DocDiscovery, SERVER_NAME, xcode_name_from_path};
pub use error::DeepDocError;
pub use evolution::{
    EvolutionSearchResults, ProposalDetails, ProposalHit, SwiftEvolution, normalize_se_number,
};
pub use hig::{HigPlatform, HigSearchLinks, HumanInterfaceGuidelines, PLATFORMS};
pub use local_docs::{
    DocSearchResults, DocumentHit, DocumentListing, LocalDocStore, MatchKind, SearchMatch,
};
pub use repos::{FetchedFile, GithubFileRef, RepoSearchLinks, RepoSearchUrls, SwiftRepos};
pub use suggestions::{Suggestion, SuggestionContext, SuggestionEngine};
pub use wwdc::{WwdcNotes, WwdcSearchLinks, WwdcSessionInfo};
