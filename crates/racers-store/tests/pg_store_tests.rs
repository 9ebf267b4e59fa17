//! Integration tests for the PostgreSQL collaborators.
//!
//! Run with `DATABASE_URL` pointing at a scratch server and `--ignored`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use racers_core::aggregate::AggregateRoot;
use racers_core::clock::SystemClock;
use racers_core::context::RequestContext;
use racers_core::error::InfrastructureError;
use racers_core::event::DomainEvent;
use racers_core::event_bus::EventBus;
use racers_core::id::Id;
use racers_core::unit_of_work::{UnitOfWork, work};
use racers_races::application::repository::{RacesGetter, RacesRepository};
use racers_races::domain::aggregates::{Race, RaceOptions};
use racers_races::domain::values::{RaceDate, RaceId, RaceName};
use racers_store::{
    PgEventBus, PgRacesRepository, PgTeamsRepository, PgUnitOfWork, PgUsersRepository,
};
use racers_teams::application::repository::TeamsRepository;
use racers_teams::application::service::TeamsService;
use racers_teams::domain::aggregates::{Team, TeamOptions};
use racers_teams::domain::commands::JoinTeam;
use racers_teams::domain::values::{TeamId, TeamName};
use racers_test_support::{FailingEventBus, YieldingEventBus};
use racers_users::application::repository::{UsersGetter, UsersRepository};
use racers_users::domain::aggregates::User;
use racers_users::domain::values::{UserId, UserName};
use sqlx::PgPool;

async fn stored_user(pool: &PgPool, name: &str) -> User {
    let user = User::new(UserId::from(Id::generate()), UserName::new(name).unwrap());
    PgUsersRepository::new(pool.clone())
        .save(&RequestContext::new(), &user)
        .await
        .unwrap();
    user
}

fn race(owner: &User) -> Race {
    Race::new(
        RaceId::from(Id::generate()),
        RaceName::new("Boston").unwrap(),
        RaceDate::restore(Utc::now() + Duration::days(1)),
        owner.id(),
        RaceOptions::default(),
    )
}

async fn event_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await
        .unwrap()
}

// --- users ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_user_round_trip(pool: PgPool) {
    let repo = PgUsersRepository::new(pool.clone());
    let user = stored_user(&pool, "Ana").await;

    let loaded = repo.get(&RequestContext::new(), user.id()).await.unwrap();

    assert_eq!(loaded.map(|u| u.name().clone()), Some(user.name().clone()));
}

// --- races ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_race_round_trip_with_competitors(pool: PgPool) {
    // Arrange
    let repo = PgRacesRepository::new(pool.clone());
    let owner = stored_user(&pool, "U1").await;
    let competitor = stored_user(&pool, "U2").await;
    let race = Race::new(
        RaceId::from(Id::generate()),
        RaceName::new("Boston").unwrap(),
        RaceDate::restore(Utc::now() + Duration::days(1)),
        owner.id(),
        RaceOptions {
            competitors: [competitor.id()].into(),
        },
    );
    let ctx = RequestContext::new();

    // Act
    repo.save(&ctx, &race).await.unwrap();
    let loaded = repo.by_id(&ctx, race.id()).await.unwrap().unwrap();
    let all = repo.all(&ctx).await.unwrap();

    // Assert
    assert_eq!(loaded.name(), race.name());
    assert_eq!(loaded.owner(), owner.id());
    assert!(loaded.has_competitor(competitor.id()));
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_exists_matches_name_and_date(pool: PgPool) {
    let repo = PgRacesRepository::new(pool.clone());
    let owner = stored_user(&pool, "U1").await;
    let stored = race(&owner);
    let ctx = RequestContext::new();
    repo.save(&ctx, &stored).await.unwrap();
    let same_slot = Race::new(
        RaceId::from(Id::generate()),
        stored.name().clone(),
        stored.date(),
        owner.id(),
        RaceOptions::default(),
    );

    assert!(repo.exists(&ctx, &same_slot).await.unwrap());
    assert!(!repo.exists(&ctx, &race(&owner)).await.unwrap());
}

// --- teams ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_by_member_finds_team(pool: PgPool) {
    let repo = PgTeamsRepository::new(pool.clone());
    let admin = stored_user(&pool, "A").await;
    let team = Team::new(
        TeamId::from(Id::generate()),
        TeamName::new("Harriers").unwrap(),
        admin.id(),
        TeamOptions::default(),
    );
    let ctx = RequestContext::new();
    repo.save(&ctx, &team).await.unwrap();

    let found = repo.by_member(&ctx, admin.id()).await.unwrap();

    assert_eq!(found.map(|t| t.id()), Some(team.id()));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_membership_is_unique_across_teams(pool: PgPool) {
    // Arrange
    let repo = PgTeamsRepository::new(pool.clone());
    let a = stored_user(&pool, "A").await;
    let b = stored_user(&pool, "B").await;
    let ctx = RequestContext::new();
    let first = Team::new(
        TeamId::from(Id::generate()),
        TeamName::new("Harriers").unwrap(),
        a.id(),
        TeamOptions::default(),
    );
    repo.save(&ctx, &first).await.unwrap();
    let second = Team::new(
        TeamId::from(Id::generate()),
        TeamName::new("Striders").unwrap(),
        b.id(),
        TeamOptions {
            members: [a.id()].into(),
        },
    );

    // Act
    let result = repo.save(&ctx, &second).await;

    // Assert
    assert!(matches!(result, Err(InfrastructureError::Infrastructure(_))));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_joins_into_two_teams_admit_one(pool: PgPool) {
    // Arrange
    let teams = PgTeamsRepository::new(pool.clone());
    let ctx = RequestContext::new();
    let mut team_ids = Vec::new();
    for name in ["Harriers", "Striders"] {
        let admin = stored_user(&pool, name).await;
        let team = Team::new(
            TeamId::from(Id::generate()),
            TeamName::new(name).unwrap(),
            admin.id(),
            TeamOptions::default(),
        );
        teams.save(&ctx, &team).await.unwrap();
        team_ids.push(team.id());
    }
    let rider = stored_user(&pool, "B").await;
    let service = TeamsService::new(
        Arc::new(teams.clone()),
        Arc::new(PgUsersRepository::new(pool.clone())),
        Arc::new(PgUnitOfWork::new(pool.clone())),
        Arc::new(YieldingEventBus::new(Arc::new(PgEventBus::new(pool.clone())))),
        Arc::new(SystemClock),
    );
    let join = |team_id: TeamId| JoinTeam {
        team_id: team_id.to_string(),
        user_id: rider.id().to_string(),
    };
    let (ctx_a, ctx_b) = (RequestContext::new(), RequestContext::new());

    // Act
    let (joined_a, joined_b) = tokio::join!(
        service.join(&ctx_a, join(team_ids[0])),
        service.join(&ctx_b, join(team_ids[1])),
    );

    // Assert
    assert_eq!([joined_a.is_ok(), joined_b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let membership = teams.by_member(&ctx, rider.id()).await.unwrap();
    assert!(membership.is_some_and(|team| team_ids.contains(&team.id())));
    let joined_events: i64 =
        sqlx::query_scalar("SELECT count(*) FROM events WHERE event_type = 'teams.user_joined'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(joined_events, 1);
}

// --- unit of work ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_unit_of_work_commits_save_and_events(pool: PgPool) {
    // Arrange
    let uow = PgUnitOfWork::new(pool.clone());
    let races = PgRacesRepository::new(pool.clone());
    let bus = PgEventBus::new(pool.clone());
    let owner = stored_user(&pool, "U1").await;
    let mut race = Race::create(
        RaceId::from(Id::generate()),
        RaceName::new("Boston").unwrap(),
        RaceDate::restore(Utc::now() + Duration::days(1)),
        owner.id(),
        Id::generate(),
        &SystemClock,
    );
    let race_id = race.id();
    let ctx = RequestContext::new();

    // Act
    uow.run(
        &ctx,
        work(move |tx| async move {
            let events = race
                .consume_events()
                .iter()
                .map(DomainEvent::to_envelope)
                .collect();
            races.save(&tx, &race).await?;
            bus.publish(&tx, events).await
        }),
    )
    .await
    .unwrap();

    // Assert
    let repo = PgRacesRepository::new(pool.clone());
    assert!(repo.by_id(&ctx, race_id).await.unwrap().is_some());
    assert_eq!(event_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_unit_of_work_rolls_back_on_publish_failure(pool: PgPool) {
    // Arrange
    let uow = PgUnitOfWork::new(pool.clone());
    let races = Arc::new(PgRacesRepository::new(pool.clone()));
    let owner = stored_user(&pool, "U1").await;
    let race = race(&owner);
    let ctx = RequestContext::new();
    let saved = Arc::clone(&races);
    let candidate = race.snapshot();

    // Act
    let result = uow
        .run(
            &ctx,
            work(move |tx| async move {
                saved.save(&tx, &race).await?;
                FailingEventBus.publish(&tx, Vec::new()).await
            }),
        )
        .await;

    // Assert
    assert!(result.is_err());
    assert!(!races.exists(&ctx, &candidate).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_unit_of_work_rejects_nesting(pool: PgPool) {
    let uow = PgUnitOfWork::new(pool.clone());
    let inner = uow.clone();

    let result = uow
        .run(
            &RequestContext::new(),
            work(move |tx| async move { inner.run(&tx, work(|_| async { Ok(()) })).await }),
        )
        .await;

    assert!(matches!(result, Err(InfrastructureError::NestedUnitOfWork)));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_cancelled_unit_of_work_commits_nothing(pool: PgPool) {
    // Arrange
    let uow = PgUnitOfWork::new(pool.clone());
    let users = PgUsersRepository::new(pool.clone());
    let user = User::new(UserId::from(Id::generate()), UserName::new("Ana").unwrap());
    let ctx = RequestContext::new();
    let saved = user.clone();

    // Act
    let result = uow
        .run(
            &ctx,
            work(move |tx| async move {
                users.save(&tx, &saved).await?;
                tx.cancellation_token().cancel();
                Ok(())
            }),
        )
        .await;

    // Assert
    assert!(matches!(result, Err(InfrastructureError::Cancelled)));
    let check = PgUsersRepository::new(pool.clone());
    assert!(
        check
            .get(&RequestContext::new(), user.id())
            .await
            .unwrap()
            .is_none()
    );
}
