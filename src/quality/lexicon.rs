// Word classes used by the grammar heuristics.
//
// These describe grammar (which words are auxiliaries, which are irregular
// past forms, which pronouns are first person), not content. Nothing here
// decides whether a topic is acceptable.

/// Lower-cased word tokens. Apostrophes inside a word are kept ("didn't").
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

pub const FIRST_PERSON: &[&str] = &[
    "i", "me", "my", "mine", "myself", "i'm", "i've", "i'd", "i'll", "im", "ive", "we", "us", "our",
    "ours", "ourselves", "we're", "we've",
];

pub const GENERIC_SUBJECTS: &[&str] = &[
    "people", "everyone", "everybody", "someone", "somebody", "nobody", "anyone", "anybody",
    "you", "they", "humans", "mankind", "humanity", "society", "life", "love", "success",
    "happiness", "one",
];

/// Words skipped when looking for the subject at the start of a sentence.
pub const DETERMINERS: &[&str] = &["the", "a", "an", "all", "most", "some", "many", "every", "real"];

/// Auxiliaries, modals and state-of-being verbs. Never a concrete action.
pub const AUX_STATE_VERBS: &[&str] = &[
    "is", "are", "am", "was", "were", "be", "been", "being", "do", "does", "did", "has", "have",
    "had", "can", "could", "should", "would", "will", "shall", "may", "might", "must", "ought",
    "think", "thought", "believe", "believed", "feel", "felt", "seem", "seemed", "know", "knew",
    "want", "wanted", "wish", "wished", "hope", "hoped", "like", "liked", "love", "loved", "need",
    "needed", "mean", "meant", "become", "became", "remain", "remained", "appear", "appeared",
];

/// Copulas and modals: the verbs of universal statements ("X should be Y").
pub const COPULA_MODAL: &[&str] = &[
    "is", "are", "am", "was", "were", "be", "can", "could", "should", "would", "will", "shall",
    "may", "might", "must", "ought", "do", "does", "did",
];

/// Words after which an "-ed" form is an adjective ("am tired", "so bored").
pub const PREDICATE_LEADS: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "i'm", "im", "feel", "feels", "felt",
    "seem", "seems", "seemed", "so", "very", "really", "too", "quite", "pretty", "extremely",
];

pub const IRREGULAR_PAST: &[&str] = &[
    "ate", "awoke", "became", "began", "bent", "bit", "blew", "bought", "broke", "brought",
    "built", "burnt", "caught", "chose", "came", "cut", "dealt", "did", "drank", "drew", "drove",
    "dug", "fed", "fell", "felt", "fled", "flew", "fought", "forgot", "forgave", "found", "froze",
    "gave", "got", "grew", "had", "heard", "held", "hid", "hit", "hung", "kept", "knew", "laid",
    "led", "left", "lent", "let", "lit", "lost", "made", "meant", "met", "paid", "put", "quit",
    "ran", "rang", "rode", "rose", "said", "sang", "sank", "sat", "saw", "sent", "set", "shook",
    "shot", "shut", "slept", "slid", "sold", "sought", "spent", "spoke", "stole", "stood",
    "struck", "stuck", "swam", "swept", "swung", "taught", "told", "took", "thought", "threw",
    "tore", "understood", "went", "woke", "won", "wore", "wrote", "wept",
];

/// Words ending in "-ed" that are not past-tense verbs.
pub const ED_EXCLUSIONS: &[&str] = &[
    "bed", "red", "fed", "led", "wed", "shed", "need", "feed", "seed", "speed", "weed", "bleed",
    "breed", "greed", "steed", "reed", "deed", "tweed", "creed", "hundred", "sacred", "naked",
    "wicked", "rugged", "sled", "embed", "indeed", "kindred",
];

/// Words ending in "-ing" that are not gerunds or participles.
pub const ING_EXCLUSIONS: &[&str] = &[
    "thing", "things", "something", "nothing", "anything", "everything", "morning", "evening",
    "ceiling", "king", "ring", "sing", "bring", "spring", "string", "sting", "swing", "wing",
    "sibling", "during", "wedding", "pudding", "darling", "duckling", "lightning",
    "herring", "icing", "ping", "ding", "cling", "fling", "sling", "viking",
];

/// Sentence openers that give advice instead of reporting something done.
pub const IMPERATIVE_OPENERS: &[&str] = &[
    "don't", "dont", "remember", "never", "always", "try", "please", "stop", "let's", "lets",
    "make sure", "do not", "be sure", "go and", "you should", "you must",
];

pub const CLAUSE_JOINERS: &[&str] = &[
    "and", "but", "because", "when", "while", "that", "which", "although", "though", "if",
    "unless", "since", "whereas",
];

/// Rows of the keyboard that gibberish tends to be mashed out of.
pub const KEYBOARD_RUNS: &[&str] = &[
    "qwert", "werty", "asdf", "sdfg", "dfgh", "hjkl", "zxcv", "xcvb", "yuiop", "uiop", "ghjk",
    "vbnm", "qazwsx", "wsxedc",
];

/// Sequences whose adjacent members show up together in numbered spam
/// ("alpha beta", "first second").
pub const SEQUENCES: &[&[&str]] = &[
    &["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"],
    &["first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth"],
];

pub fn contains(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}

/// Regular "-ed" past tense or an irregular past form.
pub fn is_past_tense(word: &str) -> bool {
    if contains(IRREGULAR_PAST, word) {
        return true;
    }
    word.len() >= 4
        && word.ends_with("ed")
        && !contains(ED_EXCLUSIONS, word)
        && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// "-ing" participle or gerund.
pub fn is_gerund(word: &str) -> bool {
    word.len() >= 5
        && word.ends_with("ing")
        && !contains(ING_EXCLUSIONS, word)
        && word.chars().all(|c| c.is_ascii_alphabetic())
}
