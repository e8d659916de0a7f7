pub mod adapter;
pub mod curseforge;
pub mod modrinth;
pub mod registry;

pub use adapter::{
    select_candidate, CandidateMatch, FileDescriptor, HostAdapter, HostIdentifier, ModCandidate,
};
pub use registry::{supported_hosts, Host};
