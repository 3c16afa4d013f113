//! Known subscription providers
//!
//! The catalog is an ordered table of (display name, category, pattern).
//! Lookup is first hit in table order, so a narrower product always sits
//! above the broader brand it belongs to ("Spotify Audiobooks" above
//! "Spotify"). [`Catalog::shadowing`] checks that ordering.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// Builtin provider table, in match order
const BUILTIN_ENTRIES: &[(&str, &str, &str)] = &[
    // Video streaming
    ("Netflix", "Streaming Vidéo", r"netflix"),
    ("Disney+", "Streaming Vidéo", r"disney\s*(\+|plus)"),
    ("Amazon Prime Video", "Streaming Vidéo", r"(amazon|amzn).*prime.*video|prime\s*video"),
    ("Apple TV+", "Streaming Vidéo", r"apple\s*tv"),
    ("HBO Max", "Streaming Vidéo", r"hbo.*max"),
    ("Hulu", "Streaming Vidéo", r"\bhulu\b"),
    ("Paramount+", "Streaming Vidéo", r"paramount\s*(\+|plus)"),
    ("Canal+", "Streaming Vidéo", r"canal\s*(\+|plus)"),
    ("Crunchyroll", "Streaming Vidéo", r"crunchyroll"),
    ("Funimation", "Streaming Vidéo", r"funimation"),
    ("WOW Presents Plus", "Streaming Vidéo", r"\bwow\b.*presents"),
    ("Mubi", "Streaming Vidéo", r"\bmubi\b"),
    ("Peacock", "Streaming Vidéo", r"\bpeacock\b"),
    ("Rakuten TV", "Streaming Vidéo", r"rakuten.*tv"),
    ("Molotov", "Streaming Vidéo", r"molotov"),
    ("Starzplay", "Streaming Vidéo", r"starz\s*play"),
    ("Shudder", "Streaming Vidéo", r"\bshudder\b"),
    ("Filmotv", "Streaming Vidéo", r"filmo\s*tv"),
    ("Ovid.tv", "Streaming Vidéo", r"ovid\.tv"),
    ("Apple One", "Streaming Vidéo", r"apple.*\bone\b"),

    // Music streaming
    ("Spotify Audiobooks", "Livres Audio", r"spotify.*audiobooks"),
    ("Spotify", "Streaming Musique", r"spotify"),
    ("Apple Music", "Streaming Musique", r"apple.*music"),
    ("Deezer", "Streaming Musique", r"deezer"),
    ("YouTube Music", "Streaming Musique", r"youtube.*music"),
    ("Tidal", "Streaming Musique", r"\btidal\b"),
    ("Amazon Music", "Streaming Musique", r"(amazon|amzn).*music"),
    ("Qobuz", "Streaming Musique", r"qobuz"),
    ("SoundCloud Go+", "Streaming Musique", r"soundcloud"),
    ("Napster", "Streaming Musique", r"napster"),
    ("Boomplay", "Streaming Musique", r"boomplay"),
    ("Anghami", "Streaming Musique", r"anghami"),

    // Audiobooks and press
    ("Audible", "Livres Audio", r"audible"),
    ("Scribd", "Livres Audio", r"\bscribd\b"),
    ("Kindle Unlimited", "Livres Audio", r"kindle.*unlimited"),
    ("YouScribe", "Livres Audio", r"youscribe"),
    ("PressReader", "Actualités & Presse", r"press\s*reader"),
    ("Le Monde", "Actualités & Presse", r"\ble\s*monde\b"),
    ("Le Figaro", "Actualités & Presse", r"\ble\s*figaro\b"),
    ("Mediapart", "Actualités & Presse", r"mediapart"),
    ("The New York Times", "Actualités & Presse", r"new\s*york\s*times|\bnytimes\b"),
    ("Washington Post", "Actualités & Presse", r"washington\s*post"),
    ("Les Échos", "Actualités & Presse", r"\bles\s*[ée]chos\b"),

    // Cloud storage
    ("Google Drive", "Stockage Cloud", r"google.*drive"),
    ("Dropbox Paper", "Productivité", r"dropbox.*paper"),
    ("Dropbox", "Stockage Cloud", r"dropbox"),
    ("iCloud", "Stockage Cloud", r"icloud"),
    ("OneDrive", "Stockage Cloud", r"one\s*drive"),
    ("pCloud", "Stockage Cloud", r"\bpcloud\b"),
    ("Mega", "Stockage Cloud", r"\bmega\b"),
    ("Amazon S3", "Stockage Cloud", r"(amazon|amzn).*s3|\baws\b"),
    ("Backblaze", "Stockage Cloud", r"backblaze"),
    ("Sync.com", "Stockage Cloud", r"sync\.com"),
    ("Box", "Stockage Cloud", r"\bbox\b"),
    ("iDrive", "Stockage Cloud", r"\bidrive\b"),

    // Gaming
    ("Xbox Game Pass", "Jeux Vidéo", r"xbox.*game\s*pass|\bgame\s*pass\b"),
    ("PlayStation Plus", "Jeux Vidéo", r"playstation.*plus|\bps\s*plus\b"),
    ("Nintendo Switch Online", "Jeux Vidéo", r"nintendo.*online"),
    ("EA Play", "Jeux Vidéo", r"\bea\s*play\b"),
    ("Ubisoft+", "Jeux Vidéo", r"ubisoft\s*(\+|plus)"),
    ("GeForce Now", "Jeux Vidéo", r"geforce.*now"),
    ("Apple Arcade", "Jeux Vidéo", r"apple.*arcade"),
    ("Shadow", "Jeux Vidéo", r"\bshadow\b"),
    ("Blacknut", "Jeux Vidéo", r"blacknut"),
    ("Roblox Premium", "Jeux Vidéo", r"roblox.*premium"),
    ("Minecraft Realms", "Jeux Vidéo", r"minecraft.*realms"),
    ("Luna (Amazon Gaming)", "Jeux Vidéo", r"\bluna\b"),
    ("Battle.net Pass", "Jeux Vidéo", r"battle\.net"),
    ("Final Fantasy XIV Subscription", "Jeux Vidéo", r"final\s*fantasy\s*xiv|\bffxiv\b"),
    ("RuneScape Membership", "Jeux Vidéo", r"runescape"),
    ("Dofus Premium", "Jeux Vidéo", r"dofus"),

    // Productivity
    ("Microsoft 365", "Productivité", r"microsoft.*365|\bmsft\b"),
    ("Google Workspace", "Productivité", r"google.*workspace|\bg\s*suite\b"),
    ("Notion", "Productivité", r"\bnotion\b"),
    ("Evernote", "Productivité", r"evernote"),
    ("Trello", "Productivité", r"trello"),
    ("Slack", "Productivité", r"\bslack\b"),
    ("Zoom", "Productivité", r"\bzoom\b"),
    ("Adobe Creative Cloud", "Productivité", r"adobe"),
    ("Grammarly", "Productivité", r"grammarly"),
    ("Canva", "Productivité", r"\bcanva\b"),
    ("Monday.com", "Productivité", r"monday\.com"),
    ("Asana", "Productivité", r"\basana\b"),
    ("ClickUp", "Productivité", r"click\s*up"),
    ("Todoist", "Productivité", r"todoist"),
    ("Obsidian Sync", "Productivité", r"obsidian"),
    ("Basecamp", "Productivité", r"basecamp"),
    ("Roam Research", "Productivité", r"roam\s*research"),
    ("Bear Pro", "Productivité", r"\bbear\b.*\bpro\b"),
    ("Superhuman", "Productivité", r"superhuman"),

    // Fitness and wellness
    ("MyFitnessPal", "Fitness & Bien-être", r"my\s*fitness\s*pal"),
    ("Strava", "Fitness & Bien-être", r"strava"),
    ("Fitbit Premium", "Fitness & Bien-être", r"fitbit"),
    ("Apple Fitness+", "Fitness & Bien-être", r"apple.*fitness"),
    ("Peloton", "Fitness & Bien-être", r"peloton"),
    ("Headspace", "Fitness & Bien-être", r"headspace"),
    ("Calm", "Fitness & Bien-être", r"\bcalm\b"),
    ("Nike Run Club Premium", "Fitness & Bien-être", r"nike.*run\s*club"),
    ("Nike Training Club", "Fitness & Bien-être", r"nike.*training"),
    ("LesMills+", "Fitness & Bien-être", r"les\s*mills"),
    ("WW (Weight Watchers)", "Fitness & Bien-être", r"weight\s*watchers|\bww\b"),
    ("8fit", "Fitness & Bien-être", r"\b8\s*fit\b"),
    ("Sweat", "Fitness & Bien-être", r"\bsweat\b"),
    ("Alo Moves", "Fitness & Bien-être", r"\balo\s*moves\b"),
    ("Glo Yoga", "Fitness & Bien-être", r"\bglo\b"),

    // Education
    ("Udemy", "Éducation", r"udemy"),
    ("Coursera", "Éducation", r"coursera"),
    ("MasterClass", "Éducation", r"master\s*class"),
    ("Skillshare", "Éducation", r"skillshare"),
    ("LinkedIn Learning", "Éducation", r"linkedin"),
    ("Duolingo Plus", "Éducation", r"duolingo"),
    ("Brilliant", "Éducation", r"\bbrilliant\b"),
    ("Khan Academy", "Éducation", r"khan\s*academy"),
    ("Codecademy", "Éducation", r"codecademy"),
    ("Rosetta Stone", "Éducation", r"rosetta\s*stone"),
    ("DataCamp", "Éducation", r"data\s*camp"),
    ("edX Premium", "Éducation", r"\bedx\b"),
    ("Memrise Pro", "Éducation", r"memrise"),
    ("SoloLearn Pro", "Éducation", r"sololearn"),
    ("Pluralsight", "Éducation", r"pluralsight"),

    // Security
    ("NordVPN", "CyberSécurité", r"nord\s*vpn"),
    ("ExpressVPN", "CyberSécurité", r"express\s*vpn"),
    ("Surfshark", "CyberSécurité", r"surfshark"),
    ("ProtonVPN", "CyberSécurité", r"proton\s*vpn"),
    ("CyberGhost", "CyberSécurité", r"cyber\s*ghost"),
    ("1Password", "CyberSécurité", r"\b1\s*password\b"),
    ("LastPass", "CyberSécurité", r"last\s*pass"),
    ("Dashlane", "CyberSécurité", r"dashlane"),
    ("ProtonMail", "CyberSécurité", r"proton\s*mail"),
    ("Malwarebytes Premium", "CyberSécurité", r"malwarebytes"),
    ("TunnelBear VPN", "CyberSécurité", r"tunnel\s*bear"),
    ("Proton Pass", "CyberSécurité", r"proton\s*pass"),
    ("Bitwarden Premium", "CyberSécurité", r"bitwarden"),

    // Commerce and delivery
    ("Amazon Prime", "E-commerce & Livraisons", r"(amazon|amzn).*prime"),
    ("Walmart+", "E-commerce & Livraisons", r"walmart\s*(\+|plus)"),
    ("Shopify", "E-commerce & Livraisons", r"shopify"),
    ("Deliveroo Plus", "E-commerce & Livraisons", r"deliveroo.*plus"),
    ("Uber One", "E-commerce & Livraisons", r"uber\s*one"),

    // Fashion and beauty
    ("Sephora Flash", "Mode & Beauté", r"sephora.*flash"),
    ("Zalando Plus", "Mode & Beauté", r"zalando.*plus"),
    ("H&M Membership", "Mode & Beauté", r"h&m.*member"),
    ("ASOS Premier", "Mode & Beauté", r"asos.*premier"),
    ("Nike Membership", "Mode & Beauté", r"nike.*member"),
    ("Beauty Pie", "Mode & Beauté", r"beauty\s*pie"),

    // Catch-all Apple billing line
    ("iTunes", "Streaming Vidéo", r"itunes"),
];

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| {
    let entries = BUILTIN_ENTRIES
        .iter()
        .map(|(name, category, pattern)| {
            CatalogEntry::new(*name, *category, pattern)
                .expect("builtin catalog patterns are valid regexes")
        })
        .collect();

    let catalog = Catalog::from_entries(entries);
    for s in catalog.shadowing() {
        warn!(
            "Catalog entry '{}' (#{}) shadows later entry '{}' (#{})",
            s.earlier, s.earlier_index, s.later, s.later_index
        );
    }
    catalog
});

/// One known provider
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub display_name: String,
    pub category: String,
    pattern: Regex,
}

impl CatalogEntry {
    /// Build an entry; the pattern is compiled case-insensitively
    pub fn new(
        display_name: impl Into<String>,
        category: impl Into<String>,
        pattern: &str,
    ) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            display_name: display_name.into(),
            category: category.into(),
            pattern,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Test the pattern against a raw (not normalized) wording
    pub fn is_match(&self, wording: &str) -> bool {
        self.pattern.is_match(wording)
    }
}

/// An earlier entry whose pattern captures a later entry's own name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shadowing {
    pub earlier_index: usize,
    pub earlier: String,
    pub later_index: usize,
    pub later: String,
}

/// Ordered, immutable provider catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The process-wide builtin catalog, compiled on first use
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry, in table order, whose pattern matches the wording
    pub fn match_wording(&self, wording: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.is_match(wording))
    }

    /// Find ordering mistakes: entry i captures the display name of some j > i
    pub fn shadowing(&self) -> Vec<Shadowing> {
        let mut found = Vec::new();
        for (i, earlier) in self.entries.iter().enumerate() {
            for (j, later) in self.entries.iter().enumerate().skip(i + 1) {
                if earlier.is_match(&later.display_name) {
                    found.push(Shadowing {
                        earlier_index: i,
                        earlier: earlier.display_name.clone(),
                        later_index: j,
                        later: later.display_name.clone(),
                    });
                }
            }
        }
        found
    }
}
