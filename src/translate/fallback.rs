/// Layman phrase → medical term. Matched as lowercase substrings, in table order.
const PHRASES: &[(&str, &str)] = &[
    ("headache", "cephalgia"),
    ("migraine", "migraine disorder"),
    ("light sensitivity", "photophobia"),
    ("sensitive to light", "photophobia"),
    ("sound sensitivity", "phonophobia"),
    ("sensitive to sound", "phonophobia"),
    ("stomach ache", "abdominal pain"),
    ("stomach pain", "abdominal pain"),
    ("belly pain", "abdominal pain"),
    ("throwing up", "emesis"),
    ("vomiting", "emesis"),
    ("feel sick", "nausea"),
    ("heartburn", "pyrosis"),
    ("dizzy", "vertigo"),
    ("dizziness", "vertigo"),
    ("fainting", "syncope"),
    ("passed out", "syncope"),
    ("runny nose", "rhinorrhea"),
    ("stuffy nose", "nasal congestion"),
    ("sore throat", "pharyngitis"),
    ("nosebleed", "epistaxis"),
    ("fever", "pyrexia"),
    ("high temperature", "pyrexia"),
    ("shortness of breath", "dyspnea"),
    ("short of breath", "dyspnea"),
    ("chest pain", "thoracic pain"),
    ("racing heart", "tachycardia"),
    ("heart racing", "tachycardia"),
    ("coughing up blood", "hemoptysis"),
    ("blood in urine", "hematuria"),
    ("pain when urinating", "dysuria"),
    ("trouble swallowing", "dysphagia"),
    ("joint pain", "arthralgia"),
    ("muscle pain", "myalgia"),
    ("muscle aches", "myalgia"),
    ("back pain", "dorsalgia"),
    ("itchy", "pruritus"),
    ("itching", "pruritus"),
    ("rash", "exanthem"),
    ("swelling", "edema"),
    ("hair loss", "alopecia"),
    ("pins and needles", "paresthesia"),
    ("numbness", "hypoesthesia"),
    ("ringing in my ears", "tinnitus"),
    ("ringing in the ears", "tinnitus"),
    ("double vision", "diplopia"),
    ("can't sleep", "insomnia"),
    ("trouble sleeping", "insomnia"),
    ("tired all the time", "chronic fatigue"),
];

/// Maps a layman description to medical terms without any provider.
/// Returns the query unchanged when nothing matches.
pub fn map_terms(query: &str) -> String {
    let lower = query.to_lowercase();
    let mut terms: Vec<&str> = Vec::new();
    for &(phrase, term) in PHRASES {
        if lower.contains(phrase) && !terms.contains(&term) {
            terms.push(term);
        }
    }

    if terms.is_empty() {
        query.to_string()
    } else {
        terms.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_headache_with_light_sensitivity() {
        assert_eq!(
            map_terms("bad headache with light sensitivity"),
            "cephalgia, photophobia"
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(map_terms("Sore Throat and FEVER"), "pharyngitis, pyrexia");
    }

    #[test]
    fn synonyms_collapse_to_one_term() {
        assert_eq!(map_terms("dizzy spells and dizziness"), "vertigo");
    }

    #[test]
    fn no_match_returns_query_unchanged() {
        assert_eq!(map_terms("Something Odd"), "Something Odd");
    }

    #[test]
    fn output_follows_table_order() {
        assert_eq!(map_terms("rash then a fever"), "pyrexia, exanthem");
    }
}
