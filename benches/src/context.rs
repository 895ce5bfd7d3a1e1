//! Random render data for the benchmarks.

use rand::Rng;

#[derive(serde::Serialize)]
pub struct Context {
    pub title: String,
    pub users: Vec<User>,
}

#[derive(serde::Serialize)]
pub struct User {
    pub name: String,
    pub age: u32,
    pub is_disabled: bool,
}

fn word<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| rng.gen_range('a'..='z')).collect()
}

/// Returns a context with a random title and `n` random users, about a quarter
/// of them disabled.
pub fn random(n: usize) -> Context {
    let mut rng = rand::thread_rng();
    Context {
        title: word(&mut rng, 20),
        users: (0..n)
            .map(|_| User {
                name: word(&mut rng, 20),
                age: rng.gen_range(21..100),
                is_disabled: rng.gen_ratio(1, 4),
            })
            .collect(),
    }
}
