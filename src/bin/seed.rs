use std::env;
use std::error::Error;

use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use uuid::Uuid;

use twitter_api::db::AppState;
use twitter_api::models::{Tweet, User, UserRecord};

fn main() -> Result<(), Box<dyn Error>> {
    println!("Starting data seeding...");

    let data_dir = env::var("TWITTER_API_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let state = AppState::open(&data_dir);

    // Configuration
    let num_users = 20;
    let tweets_per_user = 5;

    let users = seed_users(&state, num_users)?;
    seed_tweets(&state, &users, tweets_per_user)?;

    println!("Seeding completed!");
    Ok(())
}

fn seed_users(state: &AppState, count: usize) -> Result<Vec<User>, Box<dyn Error>> {
    println!("Creating {count} users...");
    let mut created = Vec::new();

    for i in 0..count {
        let user = User {
            user_id: Uuid::new_v4(),
            email: SafeEmail().fake(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            birthdate: None,
        };
        let password_hash = hash("password123", DEFAULT_COST)?;

        let record = UserRecord {
            user: user.clone(),
            password_hash,
        };
        state.users.write(move |users| {
            users.push(record);
            Ok(())
        })?;

        println!(
            "Created user {}/{}: {} ({})",
            i + 1,
            count,
            user.email,
            user.user_id
        );
        created.push(user);
    }

    Ok(created)
}

fn seed_tweets(
    state: &AppState,
    users: &[User],
    tweets_per_user: usize,
) -> Result<(), Box<dyn Error>> {
    println!("Creating {tweets_per_user} tweets per user...");
    let total = users.len() * tweets_per_user;
    let mut current = 0;

    for user in users {
        for _ in 0..tweets_per_user {
            let tweet = Tweet {
                tweet_id: Uuid::new_v4(),
                content: Sentence(3..10).fake(),
                created_at: Utc::now(),
                updated_at: None,
                by: user.clone(),
            };

            state.tweets.write(move |tweets| {
                tweets.push(tweet);
                Ok(())
            })?;

            current += 1;
            if current % 25 == 0 {
                println!("Created {current}/{total} tweets");
            }
        }
    }

    Ok(())
}
