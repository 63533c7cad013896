//! Search query construction for a vocabulary word.

/// Concrete-noun vocabulary that benefits from an explicit "object" hint.
///
/// Stock photo searches for bare nouns tend to return abstract or lifestyle
/// shots; appending "object" pulls results toward the thing itself.
const CONCRETE_NOUNS: &[&[&str]] = &[
    // food
    &[
        "apple", "bread", "cheese", "egg", "milk", "meat", "fish", "soup", "cake", "banana",
        "orange", "tomato", "potato", "onion", "carrot", "rice", "salt", "sugar", "coffee",
        "tea", "water", "wine", "beer", "butter", "honey", "pear", "grape", "lemon",
    ],
    // animal
    &[
        "dog", "cat", "horse", "cow", "pig", "sheep", "chicken", "bird", "mouse", "rabbit",
        "bear", "wolf", "fox", "duck", "goat", "snake", "frog", "bee", "lion", "donkey",
    ],
    // household
    &[
        "house", "table", "chair", "bed", "door", "window", "key", "cup", "plate", "spoon",
        "fork", "knife", "glass", "bottle", "lamp", "book", "clock", "mirror", "box", "bag",
        "pen", "phone", "sofa", "towel",
    ],
    // clothing
    &[
        "shirt", "shoe", "shoes", "hat", "coat", "dress", "sock", "socks", "jacket", "skirt",
        "trousers", "glove", "scarf", "belt",
    ],
    // vehicle
    &[
        "car", "bus", "train", "bicycle", "bike", "boat", "ship", "plane", "airplane", "truck",
        "tram", "motorcycle",
    ],
    // body
    &[
        "hand", "foot", "head", "eye", "ear", "nose", "mouth", "tooth", "hair", "arm", "leg",
        "finger", "heart",
    ],
    // nature
    &[
        "tree", "flower", "stone", "rock", "river", "mountain", "sea", "sun", "moon", "star",
        "cloud", "leaf", "grass", "lake", "forest", "island",
    ],
];

fn is_concrete(token: &str) -> bool {
    CONCRETE_NOUNS
        .iter()
        .any(|category| category.contains(&token))
}

/// First gloss of a translation hint such as `"house, home; dwelling"`.
fn primary_gloss(translation: &str) -> Option<String> {
    translation
        .split([',', ';'])
        .map(str::trim)
        .find(|gloss| !gloss.is_empty())
        .map(str::to_lowercase)
}

/// Builds the ordered list of search queries for one job.
///
/// Order: the translation hint, then `"<translation> object"` for concrete
/// nouns, then the raw word. Duplicates are dropped, first occurrence wins.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(build_queries("pas", Some("dog")), vec!["dog", "dog object", "pas"]);
/// assert_eq!(build_queries("ljubav", Some("love")), vec!["love", "ljubav"]);
/// assert_eq!(build_queries("kuća", None), vec!["kuća"]);
/// ```
pub fn build_queries(word: &str, translation: Option<&str>) -> Vec<String> {
    let mut queries: Vec<String> = Vec::with_capacity(3);

    if let Some(gloss) = translation.and_then(primary_gloss) {
        let concrete = gloss
            .split_whitespace()
            .any(|token| is_concrete(token.trim_matches(|c: char| !c.is_alphanumeric())));

        queries.push(gloss.clone());
        if concrete {
            queries.push(format!("{} object", gloss));
        }
    }

    let raw = word.trim();
    if !raw.is_empty() {
        queries.push(raw.to_string());
    }

    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.to_lowercase()));
    queries
}
