//! Curated list of high-frequency words pre-warmed by the populator.

/// The hundred most useful beginner words with their English glosses.
pub const TOP_WORDS: &[(&str, &str)] = &[
    ("kuća", "house"),
    ("pas", "dog"),
    ("mačka", "cat"),
    ("voda", "water"),
    ("kruh", "bread"),
    ("mlijeko", "milk"),
    ("jabuka", "apple"),
    ("auto", "car"),
    ("knjiga", "book"),
    ("stol", "table"),
    ("stolica", "chair"),
    ("krevet", "bed"),
    ("vrata", "door"),
    ("prozor", "window"),
    ("ključ", "key"),
    ("šalica", "cup"),
    ("tanjur", "plate"),
    ("žlica", "spoon"),
    ("vilica", "fork"),
    ("nož", "knife"),
    ("čaša", "glass"),
    ("boca", "bottle"),
    ("sat", "clock"),
    ("ogledalo", "mirror"),
    ("torba", "bag"),
    ("olovka", "pen"),
    ("telefon", "phone"),
    ("košulja", "shirt"),
    ("cipela", "shoe"),
    ("šešir", "hat"),
    ("kaput", "coat"),
    ("haljina", "dress"),
    ("čarapa", "sock"),
    ("jakna", "jacket"),
    ("autobus", "bus"),
    ("vlak", "train"),
    ("bicikl", "bicycle"),
    ("brod", "ship"),
    ("avion", "plane"),
    ("kamion", "truck"),
    ("tramvaj", "tram"),
    ("ruka", "hand"),
    ("noga", "leg"),
    ("glava", "head"),
    ("oko", "eye"),
    ("uho", "ear"),
    ("nos", "nose"),
    ("usta", "mouth"),
    ("zub", "tooth"),
    ("kosa", "hair"),
    ("srce", "heart"),
    ("drvo", "tree"),
    ("cvijet", "flower"),
    ("kamen", "stone"),
    ("rijeka", "river"),
    ("planina", "mountain"),
    ("more", "sea"),
    ("sunce", "sun"),
    ("mjesec", "moon"),
    ("zvijezda", "star"),
    ("oblak", "cloud"),
    ("list", "leaf"),
    ("trava", "grass"),
    ("jezero", "lake"),
    ("šuma", "forest"),
    ("otok", "island"),
    ("konj", "horse"),
    ("krava", "cow"),
    ("svinja", "pig"),
    ("ovca", "sheep"),
    ("kokoš", "chicken"),
    ("ptica", "bird"),
    ("miš", "mouse"),
    ("zec", "rabbit"),
    ("medvjed", "bear"),
    ("vuk", "wolf"),
    ("lisica", "fox"),
    ("patka", "duck"),
    ("riba", "fish"),
    ("sir", "cheese"),
    ("jaje", "egg"),
    ("meso", "meat"),
    ("juha", "soup"),
    ("torta", "cake"),
    ("banana", "banana"),
    ("naranča", "orange"),
    ("rajčica", "tomato"),
    ("krumpir", "potato"),
    ("luk", "onion"),
    ("mrkva", "carrot"),
    ("riža", "rice"),
    ("sol", "salt"),
    ("šećer", "sugar"),
    ("kava", "coffee"),
    ("čaj", "tea"),
    ("vino", "wine"),
    ("pivo", "beer"),
    ("maslac", "butter"),
    ("med", "honey"),
    ("limun", "lemon"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalize::normalize_word;
    use std::collections::HashSet;

    #[test]
    fn test_has_one_hundred_distinct_words() {
        let keys: HashSet<String> = TOP_WORDS.iter().map(|(w, _)| normalize_word(w)).collect();

        assert_eq!(TOP_WORDS.len(), 100);
        assert_eq!(keys.len(), 100);
    }
}
