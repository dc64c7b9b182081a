//! "Did you mean" suggestions for resolution and contract errors

/// Maximum edit distance accepted for a suggestion
const MAX_DISTANCE: usize = 3;

/// Suggest the closest candidate to `input`, if any is within a small edit distance
///
/// # Examples
///
/// ```
/// use reinhardt_stencil_core::suggest_similar;
///
/// let available = ["condition", "then", "else"];
/// assert_eq!(suggest_similar("conditon", &available), Some("condition".to_string()));
/// assert_eq!(suggest_similar("unrelated", &available), None);
/// ```
pub fn suggest_similar<S: AsRef<str>>(input: &str, available: &[S]) -> Option<String> {
	let input_lower = input.to_lowercase();
	let mut best_match: Option<(&str, usize)> = None;

	for candidate in available {
		let candidate = candidate.as_ref();
		let distance = levenshtein_distance(&input_lower, &candidate.to_lowercase());
		if distance > MAX_DISTANCE || distance == 0 && candidate == input {
			continue;
		}
		match best_match {
			Some((_, best)) if distance >= best => {}
			_ => best_match = Some((candidate, distance)),
		}
	}

	best_match.map(|(name, _)| name.to_string())
}

fn levenshtein_distance(s1: &str, s2: &str) -> usize {
	let s1: Vec<char> = s1.chars().collect();
	let s2: Vec<char> = s2.chars().collect();
	let mut previous: Vec<usize> = (0..=s2.len()).collect();
	let mut current = vec![0; s2.len() + 1];

	for (i, c1) in s1.iter().enumerate() {
		current[0] = i + 1;
		for (j, c2) in s2.iter().enumerate() {
			let cost = usize::from(c1 != c2);
			current[j + 1] = (previous[j + 1] + 1)
				.min(current[j] + 1)
				.min(previous[j] + cost);
		}
		std::mem::swap(&mut previous, &mut current);
	}

	previous[s2.len()]
}
