use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};

const PALINDROMES: [&str; 4] = ["racecar", "level", "A man a plan a canal Panama", "noon"];
const WORDS: [&str; 8] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "zephyr", "quartz", "vex",
];

/// Distinct strings mixing palindromes, multi-word phrases and random tokens.
/// Every value carries its index so fingerprints never collide.
pub fn generate_values(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| match idx % 3 {
            0 => format!("{} {idx}", PALINDROMES[idx % PALINDROMES.len()]),
            1 => {
                let words = rng.gen_range(1..6);
                let phrase: Vec<&str> = (0..words)
                    .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
                    .collect();
                format!("{} {idx}", phrase.join(" "))
            }
            _ => format!("{}{idx}", random_token(&mut rng, 24)),
        })
        .collect()
}

/// One long value for analysis throughput.
pub fn long_value(len: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    random_token(&mut rng, len)
}

fn random_token(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}
