use realtrust::fuzzy::{fuzzy_filter, fuzzy_score, match_indices, DEFAULT_MIN_SCORE};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The city search box scenario: diacritic-heavy Romanian names typed on an
/// ASCII keyboard.
#[test]
fn test_city_search_ranking() {
    let cities = strings(&[
        "Timișoara",
        "Timiș",
        "Cluj",
        "Brașov",
        "București",
        "Arad",
    ]);

    let results = fuzzy_filter("timis", &cities, DEFAULT_MIN_SCORE);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].value, "Timiș");
    assert_eq!(results[0].score, 1.0);
    assert_eq!(results[1].value, "Timișoara");
    assert_eq!(results[1].score, 0.9);
}

#[test]
fn test_scoring_ladder_tiers_are_ordered() {
    // One query, targets engineered to hit each tier; scores must come out
    // strictly descending down the ladder.
    let exact = fuzzy_score("park", "Park");
    let prefix = fuzzy_score("park", "Parking level");
    let substring = fuzzy_score("park", "Central Park Hotel");
    let acronym = fuzzy_score("ua", "Urban Apartments");
    let subsequence = fuzzy_score("prk", "Park");
    let edit = fuzzy_score("pork", "Park");

    assert_eq!(exact, 1.0);
    assert_eq!(prefix, 0.9);
    assert_eq!(substring, 0.7);
    assert_eq!(acronym, 0.6);
    assert!((0.5..0.7).contains(&subsequence));
    assert!(edit > 0.0 && edit < 0.3);
}

#[test]
fn test_filter_contract() {
    let features = strings(&[
        "Self check-in",
        "Free parking",
        "Sauna access",
        "City view",
    ]);

    // Every returned score respects the threshold and ordering
    for threshold in [0.0, 0.2, 0.5, 0.9] {
        let results = fuzzy_filter("sa", &features, threshold);
        for r in &results {
            assert!(r.score >= threshold, "{} < {}", r.score, threshold);
        }
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn test_empty_query_shows_all() {
    let features = strings(&["Self check-in", "Free parking"]);
    let results = fuzzy_filter("", &features, DEFAULT_MIN_SCORE);
    assert_eq!(results.len(), features.len());
    assert!(results.iter().all(|r| r.score == 1.0 && r.indices.is_empty()));
}

#[test]
fn test_highlight_round_trip() {
    // Substring matches highlight a contiguous ascending run of |q| chars
    for (query, target) in [
        ("park", "Central Park Hotel"),
        ("art", "ApArt Hotel"),
        ("ho", "Hotel"),
    ] {
        let indices = match_indices(query, target);
        assert_eq!(indices.len(), query.chars().count());
        for pair in indices.windows(2) {
            assert_eq!(pair[1], pair[0] + 1, "run must be contiguous");
        }
        // Indices always address real target characters
        let target_len = target.chars().count();
        assert!(indices.iter().all(|&i| i < target_len));
    }
}

#[test]
fn test_degenerate_inputs_never_panic() {
    let candidates = strings(&["x", "", "  ", "Timișoara"]);
    for query in ["", " ", "x", "much longer than any candidate here", "ș", "🏨"] {
        let _ = fuzzy_filter(query, &candidates, DEFAULT_MIN_SCORE);
        for target in &candidates {
            let score = fuzzy_score(query, target);
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
