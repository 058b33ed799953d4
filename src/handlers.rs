use actix_web::{delete, get, post, put, web, HttpResponse};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use crate::db::{self, AppState};
use crate::error::ApiError;
use crate::models::{CreateTweetRequest, Tweet, User, UserRecord, UserRegister};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup)
        .service(login)
        .service(list_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user)
        .service(home)
        .service(post_tweet)
        .service(get_tweet)
        .service(update_tweet)
        .service(delete_tweet);
}

#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<UserRegister>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let password_hash = hash(body.password.as_bytes(), DEFAULT_COST)?;
    let user = body.profile();

    let created = state.users.write(move |users| {
        if users.iter().any(|r| r.user.user_id == user.user_id) {
            return Err(ApiError::Conflict(format!(
                "a user with id {} already exists",
                user.user_id
            )));
        }
        if users.iter().any(|r| r.user.email == user.email) {
            return Err(ApiError::Conflict(format!(
                "a user with email {} already exists",
                user.email
            )));
        }
        users.push(UserRecord {
            user: user.clone(),
            password_hash,
        });
        Ok(user)
    })?;

    info!("Registered user {}", created.user_id);
    Ok(HttpResponse::Created().json(created))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<UserRegister>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let users = state.users.read()?;
    let record = db::find(&users, "user", |r| r.user.email == body.email)?;
    if !verify(body.password.as_bytes(), &record.password_hash)? {
        debug!("Password mismatch for {}", body.email);
        return Err(ApiError::InvalidCredentials);
    }

    info!("User {} logged in", record.user.user_id);
    Ok(HttpResponse::Ok().json(&record.user))
}

#[get("/users")]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.users.read()?;
    let profiles: Vec<User> = users.into_iter().map(|r| r.user).collect();
    debug!("Listing {} users", profiles.len());
    Ok(HttpResponse::Ok().json(profiles))
}

#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let users = state.users.read()?;
    let record = db::find(&users, "user", |r| r.user.user_id == id)?;
    Ok(HttpResponse::Ok().json(&record.user))
}

#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UserRegister>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let body = body.into_inner();
    body.validate()?;

    let password_hash = hash(body.password.as_bytes(), DEFAULT_COST)?;
    let updated = state.users.write(move |users| {
        let idx = db::find_index(users, "user", |r| r.user.user_id == id)?;
        // Identity is immutable: the id and email in the body are ignored.
        let record = &mut users[idx];
        record.user.first_name = body.first_name;
        record.user.last_name = body.last_name;
        record.user.birthdate = body.birthdate;
        record.password_hash = password_hash;
        Ok(record.user.clone())
    })?;

    info!("Updated user {id}");
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let removed = state.users.write(move |users| {
        let idx = db::find_index(users, "user", |r| r.user.user_id == id)?;
        Ok(users.remove(idx).user)
    })?;

    info!("Deleted user {id}");
    Ok(HttpResponse::Ok().json(removed))
}

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tweets = state.tweets.read()?;
    debug!("Listing {} tweets", tweets.len());
    Ok(HttpResponse::Ok().json(tweets))
}

#[post("/post")]
pub async fn post_tweet(
    state: web::Data<AppState>,
    body: web::Json<CreateTweetRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    body.validate()?;

    let tweet = Tweet {
        tweet_id: body.tweet_id,
        content: body.content,
        created_at: Utc::now(),
        updated_at: None,
        by: body.by,
    };

    let created = state.tweets.write(move |tweets| {
        if tweets.iter().any(|t| t.tweet_id == tweet.tweet_id) {
            return Err(ApiError::Conflict(format!(
                "a tweet with id {} already exists",
                tweet.tweet_id
            )));
        }
        tweets.push(tweet.clone());
        Ok(tweet)
    })?;

    info!("Tweet created: {}", created.tweet_id);
    Ok(HttpResponse::Created().json(created))
}

#[get("/tweets/{id}")]
pub async fn get_tweet(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let tweets = state.tweets.read()?;
    let tweet = db::find(&tweets, "tweet", |t| t.tweet_id == id)?;
    Ok(HttpResponse::Ok().json(tweet))
}

#[put("/tweets/{id}")]
pub async fn update_tweet(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateTweetRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let body = body.into_inner();
    body.validate()?;

    let updated = state.tweets.write(move |tweets| {
        let idx = db::find_index(tweets, "tweet", |t| t.tweet_id == id)?;
        // Edits rewrite the matched record; the collection never grows here.
        let tweet = &mut tweets[idx];
        tweet.content = body.content;
        tweet.updated_at = Some(Utc::now());
        Ok(tweet.clone())
    })?;

    info!("Updated tweet {id}");
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/tweets/{id}")]
pub async fn delete_tweet(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let removed = state.tweets.write(move |tweets| {
        let idx = db::find_index(tweets, "tweet", |t| t.tweet_id == id)?;
        Ok(tweets.remove(idx))
    })?;

    info!("Deleted tweet {id}");
    Ok(HttpResponse::Ok().json(removed))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("{raw} is not a valid id")))
}
