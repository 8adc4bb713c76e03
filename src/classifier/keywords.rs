//! Keyword tables. Matching against these is plain substring containment on
//! lower-cased text, so entries must stay lower-case and are kept verbatim
//! (including the odd leading space) for score compatibility.

/// Category tables used by the full classifier, in reporting order.
pub const DEFENSE_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "terrorism",
        &[
            "terrorist",
            "terrorism",
            "jihad",
            "suicide bomb",
            "ied",
            "isis",
            "al qaeda",
            "taliban",
            "extremist",
            "radical",
            "militant",
            "insurgent",
            "attack plan",
            "threat assessment",
            "security alert",
            "bomb threat",
            "hijack",
            "hostage",
        ],
    ),
    (
        "military",
        &[
            "military",
            "army",
            "navy",
            "air force",
            "defense",
            "soldier",
            "troop",
            "deployment",
            "operation",
            "mission",
            "combat",
            "warfare",
            "strategy",
            "intelligence",
            "surveillance",
            "reconnaissance",
            "base",
            "camp",
        ],
    ),
    (
        "weapons",
        &[
            "weapon",
            "missile",
            "rocket",
            "bomb",
            "explosive",
            "ammunition",
            "gun",
            "rifle",
            "artillery",
            "tank",
            "aircraft",
            "drone",
            "cyber weapon",
            "nuclear",
            "chemical weapon",
            "biological weapon",
            "drone strike",
        ],
    ),
    (
        "cyber_security",
        &[
            "cyber attack",
            "hacking",
            "malware",
            "ransomware",
            "data breach",
            "cyber warfare",
            "ddos",
            "phishing",
            "cyber espionage",
            "hacker",
            "cybersecurity",
            "vulnerability",
            "zero day",
            "backdoor",
        ],
    ),
    (
        "border_security",
        &[
            "border",
            "smuggling",
            "infiltration",
            "illegal crossing",
            "surveillance",
            "patrol",
            "checkpoint",
            "customs",
            "immigration",
            "refugee crisis",
        ],
    ),
    (
        "violence",
        &[
            "violence",
            "riot",
            "protest",
            "unrest",
            "conflict",
            "clash",
            "shooting",
            "stabbing",
            "attack",
            "assault",
            "murder",
            "killing",
            "death toll",
        ],
    ),
];

/// High-priority phrases; any one of them forces a HIGH threat level.
pub const THREAT_INDICATORS: &[&str] = &[
    "imminent attack",
    "planned attack",
    "security threat",
    "credible threat",
    "intelligence warning",
    "alert level",
    "emergency response",
    "evacuation",
    "lockdown",
    "high alert",
    "security breach",
    "suspicious activity",
    "security alert",
];

/// Coarser tables for the quick strategy.
pub const QUICK_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "military",
        &["military", "army", "navy", "defense", "soldier", "combat", "operation"],
    ),
    (
        "weapons",
        &["weapon", "missile", "bomb", "gun", "aircraft", "drone"],
    ),
    (
        "security",
        &["security", "threat", "attack", "terrorism", "alert", "surveillance"],
    ),
    (
        "cyber",
        &["cyber", "hacking", "malware", "breach", "ransomware"],
    ),
];

pub const QUICK_THREAT_WORDS: &[&str] = &[
    "attack",
    "threat",
    "terrorism",
    "bomb",
    "missile",
    "alert",
    "emergency",
];

/// Any one of these makes a fetched page worth keeping.
pub const HIGH_IMPACT_KEYWORDS: &[&str] = &[
    "defense",
    "defence",
    "military",
    "army",
    "navy",
    "air force",
    "terrorism",
    "terrorist",
    "attack",
    "threat",
    "security",
    "missile",
    "drone",
    "cyber",
    "warfare",
    "conflict",
    "border",
    "infiltration",
    "encounter",
    "operation",
    "weapons",
    "ammunition",
    "explosive",
    "ied",
    "intelligence",
    "surveillance",
    "reconnaissance",
    "nsg",
    "crpf",
    "bsf",
    "itbp",
    "cisf",
    "raw",
    "ib",
    "pakistan",
    "china",
    "kashmir",
    "loc",
    "lac",
];

/// Weaker signals; a page needs several of these to pass the gate.
pub const GENERAL_KEYWORDS: &[&str] = &[
    "soldier",
    "troop",
    "deployment",
    "base",
    "camp",
    "exercise",
    "training",
    "patrol",
    "checkpoint",
    "smuggling",
    "illegal crossing",
    "refugee",
    "hijack",
    "hostage",
    "bomb",
    "gun",
    "rifle",
    "artillery",
    "tank",
    "aircraft",
    "fighter jet",
    "warship",
    "submarine",
    "destroyer",
    "frigate",
    "satellite",
    "radar",
    "sonar",
    "missile system",
    "border security",
    "coastal security",
    "maritime security",
    "cyber attack",
    "hacking",
    "malware",
    "ransomware",
    "data breach",
    "cyber warfare",
    "ddos",
    "phishing",
    "extremist",
    "radical",
    "militant",
    "insurgent",
    "suicide bomb",
    "ied",
    " improvised explosive device",
    "security alert",
    "threat assessment",
    "emergency response",
];
