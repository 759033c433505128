// Settings key registry
// Every name persisted in settings.json is declared here and nowhere else.

/// Application version, stamped into every saved settings file
pub const LUMINANCEVERSION: &str = "2.1.0-alpha1";

/// Version of the tone mapping settings file format
pub const TMOSETTINGSVERSION: &str = "0.5";

/// Section used for keys that belong to no `GROUP_*` section
pub const GENERAL_SECTION: &str = "General";

pub const GROUP_EXTERNALTOOLS: &str = "External_Tools_Options";
pub const GROUP_HDRVISUALIZATION: &str = "HDR_visualization";
pub const GROUP_TONEMAPPING: &str = "Tonemapping_Options";
pub const GROUP_TIFF: &str = "TIFF_Options";
pub const GROUP_TMOWINDOW: &str = "TMOWindow_Options";
pub const GROUP_TMOWARNING: &str = "TMOWarning_Options";
pub const GROUP_RAW_CONVERSION_OPTIONS: &str = "Raw_Conversion_Options";

/// Every `GROUP_*` constant as (constant name, section token)
pub const GROUPS: &[(&str, &str)] = &[
    ("GROUP_EXTERNALTOOLS", GROUP_EXTERNALTOOLS),
    ("GROUP_HDRVISUALIZATION", GROUP_HDRVISUALIZATION),
    ("GROUP_TONEMAPPING", GROUP_TONEMAPPING),
    ("GROUP_TIFF", GROUP_TIFF),
    ("GROUP_TMOWINDOW", GROUP_TMOWINDOW),
    ("GROUP_TMOWARNING", GROUP_TMOWARNING),
    ("GROUP_RAW_CONVERSION_OPTIONS", GROUP_RAW_CONVERSION_OPTIONS),
];

/// Functional area a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    /// Main and tone mapping window state, interface language
    Toolbar,
    ExternalTools,
    HdrVisualization,
    Tonemapping,
    Tiff,
    TmoWindow,
    TmoWarning,
    RawConversion,
    /// Last used directories and the recent files list
    RecentPaths,
}

impl Group {
    pub const ALL: [Group; 9] = [
        Group::Toolbar,
        Group::ExternalTools,
        Group::HdrVisualization,
        Group::Tonemapping,
        Group::Tiff,
        Group::TmoWindow,
        Group::TmoWarning,
        Group::RawConversion,
        Group::RecentPaths,
    ];

    /// The `GROUP_*` section token, or None for keys stored at the top level
    pub const fn section(self) -> Option<&'static str> {
        match self {
            Group::Toolbar | Group::RecentPaths => None,
            Group::ExternalTools => Some(GROUP_EXTERNALTOOLS),
            Group::HdrVisualization => Some(GROUP_HDRVISUALIZATION),
            Group::Tonemapping => Some(GROUP_TONEMAPPING),
            Group::Tiff => Some(GROUP_TIFF),
            Group::TmoWindow => Some(GROUP_TMOWINDOW),
            Group::TmoWarning => Some(GROUP_TMOWARNING),
            Group::RawConversion => Some(GROUP_RAW_CONVERSION_OPTIONS),
        }
    }

    /// Section name as it appears in the settings file
    pub const fn section_name(self) -> &'static str {
        match self.section() {
            Some(section) => section,
            None => GENERAL_SECTION,
        }
    }

    /// Short lowercase label used on the command line
    pub fn label(self) -> &'static str {
        match self {
            Group::Toolbar => "toolbar",
            Group::ExternalTools => "external-tools",
            Group::HdrVisualization => "hdr-visualization",
            Group::Tonemapping => "tonemapping",
            Group::Tiff => "tiff",
            Group::TmoWindow => "tmo-window",
            Group::TmoWarning => "tmo-warning",
            Group::RawConversion => "raw-conversion",
            Group::RecentPaths => "recent-paths",
        }
    }

    /// Label or `GROUP_*` section token. `General` is shared by several
    /// groups and matches none; see [`keys_in_section`].
    pub fn from_label(label: &str) -> Option<Group> {
        Group::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(label) || g.section() == Some(label))
    }
}

/// One persisted setting name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettingsKey {
    /// Name of the constant, e.g. `KEY_NUM_BATCH_THREADS`
    pub name: &'static str,
    /// Token written to the settings file
    pub key: &'static str,
    pub group: Group,
}

impl SettingsKey {
    pub const fn section_name(&self) -> &'static str {
        self.group.section_name()
    }
}

macro_rules! settings_keys {
    ($( $group:ident { $( $(#[$meta:meta])* $name:ident = $token:literal ),* $(,)? } )*) => {
        $($(
            $(#[$meta])*
            pub const $name: &str = $token;
        )*)*

        /// The whole catalog, in declaration order
        pub const KEYS: &[SettingsKey] = &[
            $($(
                SettingsKey { name: stringify!($name), key: $token, group: Group::$group },
            )*)*
        ];
    };
}

settings_keys! {
    Toolbar {
        KEY_TOOLBAR_MODE = "MainWindowToolbarVisualizationMode",
        KEY_TM_TOOLBAR_MODE = "TonemappingWindowToolbarVisualizationMode",
        KEY_MANUAL_AG_MASK_COLOR = "ManualAntiGhostingMaskColor",
        KEY_GUI_LANG = "UserInterfaceLanguage",
    }
    ExternalTools {
        KEY_EXTERNAL_AIS_OPTIONS = "ExternalAlignImageStackOptions",
    }
    HdrVisualization {
        KEY_NANINFCOLOR = "nan_inf_color",
        KEY_NEGCOLOR = "neg_color",
    }
    Tonemapping {
        KEY_TEMP_RESULT_PATH = "TemporaryFilesPath",
        KEY_BATCH_LDR_FORMAT = "Batch_LDR_Format",
        KEY_NUM_BATCH_THREADS = "Num_Batch_Threads",
    }
    Tiff {
        KEY_SAVE_LOGLUV = "TiffSaveLogLuv",
    }
    TmoWindow {
        KEY_TMOWINDOW_MAX = "TMOWindow_Max",
        KEY_TMOWINDOW_SHOWPROCESSED = "TMOWindow_ShowProcessed",
        KEY_TMOWINDOW_SHOWPREVIEWPANEL = "TMOWindow_ShowPreviewPanel",
    }
    TmoWarning {
        KEY_TMOWARNING_FATTALSMALL = "TMOWarning_fattalsmall",
    }
    RawConversion {
        KEY_ABER_0 = "aber_0",
        KEY_ABER_1 = "aber_1",
        KEY_ABER_2 = "aber_2",
        KEY_ABER_3 = "aber_3",
        KEY_GAMM_0 = "gamm_0",
        KEY_GAMM_1 = "gamm_1",
        KEY_TK = "TK",
        KEY_GREEN = "green",
        KEY_USER_MUL_0 = "user_mul_0",
        KEY_USER_MUL_1 = "user_mul_1",
        KEY_USER_MUL_2 = "user_mul_2",
        KEY_USER_MUL_3 = "user_mul_3",
        KEY_USE_AUTO_BRIGHTNESS = "use_auto_brightness",
        KEY_BRIGHTNESS = "brightness",
        KEY_THRESHOLD = "threshold",
        KEY_HALF_SIZE = "half_size",
        KEY_FOUR_COLOR_RGB = "four_color_rgb",
        KEY_HIGHLIGHTS = "highlights",
        KEY_LEVEL = "level",
        KEY_WB_METHOD = "wb_method",
        KEY_OUTPUT_COLOR = "output_color",
        KEY_OUTPUT_PROFILE = "output_profile",
        KEY_CAMERA_PROFILE = "camera_profile",
        KEY_USER_FLIP = "user_flip",
        KEY_USER_QUAL = "user_qual",
        KEY_USER_BLACK = "user_black",
        KEY_USER_SAT = "user_sat",
        KEY_MED_PASSES = "med_passes",
        KEY_AUTO_BRIGHT = "auto_bright",
        KEY_AUTO_BRIGHT_THR = "auto_bright_thr",
        KEY_ADJUST_MAXIMUM_THR = "adjust_maximum_thr",
        KEY_DO_NOT_USE_FUJI_ROTATE = "do_not_use_fuji_rotate",
        KEY_USE_BLACK = "use_black",
        KEY_USE_SAT = "use_sat",
        KEY_USE_NOISE = "use_noise",
        KEY_USE_CHROMA = "use_chroma",
        KEY_USER_QUAL_TOOLBUTTON = "user_qual_toolButton",
        KEY_MED_PASSES_TOOLBUTTON = "med_passes_toolButton",
        KEY_WB_METHOD_TOOLBUTTON = "wb_method_toolButton",
        KEY_TK_TOOLBUTTON = "TK_toolButton",
        KEY_MULTIPLIERS_TOOLBUTTON = "multipliers_toolButton",
        KEY_HIGHLIGHTS_TOOLBUTTON = "highlights_toolButton",
        KEY_LEVEL_TOOLBUTTON = "level_toolButton",
        KEY_BRIGHTNESS_TOOLBUTTON = "brightness_toolButton",
        KEY_USER_BLACK_TOOLBUTTON = "user_black_toolButton",
        KEY_USER_SAT_TOOLBUTTON = "user_sat_toolButton",
        KEY_THRESHOLD_TOOLBUTTON = "threshold_toolButton",
        KEY_RED_TOOLBUTTON = "red_toolButton",
        KEY_BLUE_TOOLBUTTON = "blue_toolButton",
        KEY_GREEN_TOOLBUTTON = "green_toolButton",
    }
    RecentPaths {
        KEY_RECENT_PATH_LOAD_SAVE_HDR = "Recent_path_loadsave_hdr",
        KEY_RECENT_FILES = "Recent_files_list",
        KEY_RECENT_PATH_LOAD_SAVE_TMO_SETTINGS = "Recent_path_TMO_settings",
        KEY_RECENT_PATH_SAVE_LDR = "Recent_path_save_ldr",
        #[allow(non_upper_case_globals)]
        KEY_RECENT_PATH_LOAD_LDRs_FOR_HDR = "Recent_path_input_for_hdr",
        KEY_RECENT_PATH_EXIF_FROM = "Recent_path_exif_from",
        KEY_RECENT_PATH_EXIF_TO = "Recent_path_exif_to",
    }
}

// Two settings sharing a token would silently overwrite each other in the
// store, so a duplicate anywhere in the catalog stops the build.
const _: () = assert!(catalog_is_unique(), "settings catalog contains a duplicate token");

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Index pair of the first two keys sharing a token, if any
pub const fn first_collision(keys: &[SettingsKey]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i < keys.len() {
        let mut j = i + 1;
        while j < keys.len() {
            if str_eq(keys[i].key, keys[j].key) {
                return Some((i, j));
            }
            j += 1;
        }
        i += 1;
    }
    None
}

/// Registry entry for a token. Used in a `const`, an unknown token fails the build.
pub const fn key_for(token: &str) -> &'static SettingsKey {
    let mut i = 0;
    while i < KEYS.len() {
        if str_eq(KEYS[i].key, token) {
            return &KEYS[i];
        }
        i += 1;
    }
    panic!("token is not in the settings registry");
}

/// True when no token in the catalog (keys, sections, version literals) repeats
pub const fn catalog_is_unique() -> bool {
    if first_collision(KEYS).is_some() {
        return false;
    }

    let mut i = 0;
    while i < GROUPS.len() {
        let section = GROUPS[i].1;
        if str_eq(section, GENERAL_SECTION) {
            return false;
        }
        let mut j = i + 1;
        while j < GROUPS.len() {
            if str_eq(section, GROUPS[j].1) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }

    let mut k = 0;
    while k < KEYS.len() {
        let key = KEYS[k].key;
        if str_eq(key, LUMINANCEVERSION) || str_eq(key, TMOSETTINGSVERSION) {
            return false;
        }
        if str_eq(key, GENERAL_SECTION) {
            return false;
        }
        let mut g = 0;
        while g < GROUPS.len() {
            if str_eq(key, GROUPS[g].1) {
                return false;
            }
            g += 1;
        }
        k += 1;
    }

    !str_eq(LUMINANCEVERSION, TMOSETTINGSVERSION)
}

/// Section names must be non-empty ASCII words (letters, digits, underscore)
pub fn is_valid_section_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Look up a key by its constant name (`KEY_GUI_LANG`)
pub fn find_by_name(name: &str) -> Option<&'static SettingsKey> {
    KEYS.iter().find(|k| k.name == name)
}

/// Look up a key by its persisted token (`UserInterfaceLanguage`)
pub fn find_by_token(token: &str) -> Option<&'static SettingsKey> {
    KEYS.iter().find(|k| k.key == token)
}

/// Accepts either form, constant name first
pub fn resolve(name_or_token: &str) -> Option<&'static SettingsKey> {
    find_by_name(name_or_token).or_else(|| find_by_token(name_or_token))
}

pub fn keys_in(group: Group) -> impl Iterator<Item = &'static SettingsKey> {
    KEYS.iter().filter(move |k| k.group == group)
}

/// Keys stored in a settings file section, including `General`
pub fn keys_in_section(section: &str) -> impl Iterator<Item = &'static SettingsKey> + '_ {
    KEYS.iter().filter(move |k| k.section_name() == section)
}

/// Problems found by [`validate`], one line each
pub fn validate() -> Vec<String> {
    let mut problems = Vec::new();

    if let Some((a, b)) = first_collision(KEYS) {
        problems.push(format!(
            "{} and {} share the token \"{}\"",
            KEYS[a].name, KEYS[b].name, KEYS[a].key
        ));
    }

    for (name, section) in GROUPS {
        if !is_valid_section_name(section) {
            problems.push(format!("{} has an invalid section name \"{}\"", name, section));
        }
    }

    for (a, (name_a, section_a)) in GROUPS.iter().enumerate() {
        for (name_b, section_b) in &GROUPS[a + 1..] {
            if section_a == section_b {
                problems.push(format!("{} and {} share the section \"{}\"", name_a, name_b, section_a));
            }
        }
    }

    for key in KEYS {
        if key.key.is_empty() {
            problems.push(format!("{} is empty", key.name));
        }
    }

    for (name, literal) in [
        ("LUMINANCEVERSION", LUMINANCEVERSION),
        ("TMOSETTINGSVERSION", TMOSETTINGSVERSION),
    ] {
        if let Err(e) = crate::version::Version::parse(literal) {
            problems.push(format!("{}: {}", name, e));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_unique() {
        assert!(catalog_is_unique());
        assert_eq!(first_collision(KEYS), None);

        let mut seen = HashSet::new();
        for key in KEYS {
            assert!(seen.insert(key.key), "duplicate token {}", key.key);
        }
        for (_, section) in GROUPS {
            assert!(seen.insert(*section), "section {} collides", section);
        }
        assert!(seen.insert(LUMINANCEVERSION));
        assert!(seen.insert(TMOSETTINGSVERSION));
    }

    #[test]
    fn test_constant_names_are_unique() {
        let names: HashSet<_> = KEYS.iter().map(|k| k.name).collect();
        assert_eq!(names.len(), KEYS.len());
    }

    #[test]
    fn test_collision_is_reported() {
        let keys = [
            SettingsKey { name: "KEY_FOO", key: "foo_opt", group: Group::Tonemapping },
            SettingsKey { name: "KEY_OTHER", key: "other_opt", group: Group::Tonemapping },
            SettingsKey { name: "KEY_BAR", key: "foo_opt", group: Group::RawConversion },
        ];
        assert_eq!(first_collision(&keys), Some((0, 2)));
        assert_eq!(first_collision(&keys[..2]), None);
    }

    #[test]
    fn test_catalog_size() {
        assert_eq!(KEYS.len(), 72);
        assert_eq!(GROUPS.len(), 7);
    }

    #[test]
    fn test_group_sections() {
        for (_, section) in GROUPS {
            assert!(is_valid_section_name(section));
        }
        assert!(is_valid_section_name(GENERAL_SECTION));

        // every GROUP_* constant is reachable from exactly one Group
        for (name, section) in GROUPS {
            let owners = Group::ALL.iter().filter(|g| g.section() == Some(*section)).count();
            assert_eq!(owners, 1, "{} is not owned by exactly one group", name);
        }
        assert_eq!(Group::Toolbar.section(), None);
        assert_eq!(Group::RecentPaths.section_name(), GENERAL_SECTION);
    }

    #[test]
    fn test_invalid_section_names() {
        assert!(!is_valid_section_name(""));
        assert!(!is_valid_section_name("TIFF Options"));
        assert!(!is_valid_section_name("Raw/Conversion"));
    }

    #[test]
    fn test_lookup() {
        let key = find_by_name("KEY_NUM_BATCH_THREADS").unwrap();
        assert_eq!(key.key, KEY_NUM_BATCH_THREADS);
        assert_eq!(key.section_name(), GROUP_TONEMAPPING);

        assert_eq!(find_by_token("TK").unwrap().name, "KEY_TK");
        assert_eq!(resolve("Recent_path_input_for_hdr").unwrap().name, "KEY_RECENT_PATH_LOAD_LDRs_FOR_HDR");
        assert!(resolve("KEY_DOES_NOT_EXIST").is_none());
    }

    #[test]
    fn test_key_for() {
        const LANG: &SettingsKey = key_for(KEY_GUI_LANG);
        assert_eq!(LANG.name, "KEY_GUI_LANG");
        assert_eq!(LANG.group, Group::Toolbar);
    }

    #[test]
    #[should_panic]
    fn test_key_for_unknown_token() {
        let token = String::from("foo_opt");
        key_for(&token);
    }

    #[test]
    fn test_keys_in_group() {
        assert_eq!(keys_in(Group::HdrVisualization).count(), 2);
        assert_eq!(keys_in(Group::RawConversion).count(), 50);
        assert_eq!(keys_in(Group::RecentPaths).count(), 7);
        let total: usize = Group::ALL.iter().map(|g| keys_in(*g).count()).sum();
        assert_eq!(total, KEYS.len());
    }

    #[test]
    fn test_group_labels() {
        for group in Group::ALL {
            assert_eq!(Group::from_label(group.label()), Some(group));
        }
        assert_eq!(Group::from_label("TIFF_Options"), Some(Group::Tiff));
        assert_eq!(Group::from_label("nope"), None);
        assert_eq!(Group::from_label(GENERAL_SECTION), None);
    }

    #[test]
    fn test_general_section_spans_groups() {
        let general: Vec<_> = keys_in_section(GENERAL_SECTION).collect();
        assert_eq!(general.len(), keys_in(Group::Toolbar).count() + keys_in(Group::RecentPaths).count());
        assert_eq!(general.len(), 11);
        assert!(general.iter().any(|k| k.key == KEY_GUI_LANG));
        assert!(general.iter().any(|k| k.key == KEY_RECENT_FILES));
        assert_eq!(keys_in_section(GROUP_TIFF).count(), keys_in(Group::Tiff).count());
        assert_eq!(keys_in_section("nope").count(), 0);
    }

    #[test]
    fn test_validate_clean_catalog() {
        assert!(validate().is_empty(), "{:?}", validate());
    }
}
