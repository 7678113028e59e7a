//! Built-in key lists.

/// Keys that stress URL encoding and path handling: whitespace, reserved
/// punctuation, path-like shapes, percent sequences and control characters.
pub(crate) const NAUGHTY: &[&str] = &[
    "plain-key.bin",
    " leading-space",
    "trailing-space ",
    "inner space",
    "two  spaces",
    "tab\there",
    "new\nline",
    "carriage\rreturn",
    "bell\u{7}",
    "delete\u{7f}",
    "!",
    "\"quoted\"",
    "#hash",
    "$dollar",
    "%percent",
    "%20",
    "%2F",
    "%25",
    "&ampersand",
    "'apostrophe'",
    "(parens)",
    "*star",
    "+plus",
    ",comma",
    "-dash",
    ".dot",
    "..",
    "...",
    "./relative",
    "../parent",
    "a/../b",
    "a//b",
    "dir/",
    "/leading-slash",
    ":colon",
    ";semicolon",
    "<angle>",
    "=equals",
    "?question",
    "@at",
    "[brackets]",
    "\\backslash",
    "^caret",
    "_underscore",
    "`backtick`",
    "{braces}",
    "|pipe",
    "~tilde",
    "a?b=c&d=e",
    "name#fragment",
    "CON",
    "NUL.txt",
    "x-amz-meta",
    "null",
    "undefined",
    "0",
    "-1",
    "1e308",
];

/// Multi-script, combining, emoji and right-to-left keys.
pub(crate) const UNICODE: &[&str] = &[
    "café",
    "cafe\u{301}",
    "naïve",
    "español",
    "Ελληνικά",
    "русский",
    "עברית",
    "العربية",
    "हिन्दी",
    "ไทย",
    "中文",
    "日本語",
    "한국어",
    "Ω≈ç√∫",
    "¡™£¢∞§¶•ªº",
    "zero\u{200b}width",
    "bom\u{feff}",
    "rtl\u{202e}override",
    "nbsp\u{a0}space",
    "ideographic\u{3000}space",
    "🦀",
    "🏳️‍🌈",
    "👩‍👩‍👧‍👦",
    "1️⃣",
    "Ⓤⓝⓘⓒⓞⓓⓔ",
    "𝕿𝖍𝖊 𝖖𝖚𝖎𝖈𝖐",
    "Z̤͔ͧ̑̓ä͖̭̈̇lͮ̒ͫǫ̗",
    "ﬁ ligature",
    "İstanbul",
    "ß",
];
