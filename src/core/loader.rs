/// Mod loaders the hosts know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderType {
    Forge,
    Cauldron,
    LiteLoader,
    Fabric,
    Quilt,
    NeoForge,
}

impl LoaderType {
    /// Map CurseForge's numeric `modLoader` code. `0` ("any") and unknown
    /// codes carry no loader information.
    pub fn from_curseforge_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(LoaderType::Forge),
            2 => Some(LoaderType::Cauldron),
            3 => Some(LoaderType::LiteLoader),
            4 => Some(LoaderType::Fabric),
            5 => Some(LoaderType::Quilt),
            6 => Some(LoaderType::NeoForge),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoaderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderType::Forge => write!(f, "forge"),
            LoaderType::Cauldron => write!(f, "cauldron"),
            LoaderType::LiteLoader => write!(f, "liteloader"),
            LoaderType::Fabric => write!(f, "fabric"),
            LoaderType::Quilt => write!(f, "quilt"),
            LoaderType::NeoForge => write!(f, "neoforge"),
        }
    }
}
