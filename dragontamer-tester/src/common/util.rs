use anyhow::{Context, Result};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse comma-separated seeds, keeping their order and dropping repeats.
pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for token in split_csv(s) {
        let seed = token
            .parse::<u64>()
            .with_context(|| format!("invalid seed {token:?}"))?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    anyhow::ensure!(!seeds.is_empty(), "at least one seed is required");
    Ok(seeds)
}
