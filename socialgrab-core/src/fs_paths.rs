pub fn app_data_dir() -> Option<std::path::PathBuf> {
    if let Ok(dir) = std::env::var("SOCIALGRAB_DATA_DIR") {
        return Some(std::path::PathBuf::from(dir));
    }
    dirs::data_dir().map(|d| d.join("socialgrab"))
}

pub fn managed_bin_dir() -> Option<std::path::PathBuf> {
    app_data_dir().map(|d| d.join("bin"))
}

pub fn settings_file() -> Option<std::path::PathBuf> {
    app_data_dir().map(|d| d.join("settings.json"))
}
