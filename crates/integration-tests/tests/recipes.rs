//! Recipe composition, queries and the shopping list against a real database.
//!
//! Skipped unless `FOODGRAM_TEST_DATABASE_URL` is set.

#![allow(clippy::unwrap_used)]

use foodgram_api::db::IngredientRepository;
use foodgram_api::models::{PageRequest, RecipeChanges, RecipeFilter};
use foodgram_api::services::{
    RecipeService, RelationService, RelationTarget, ServiceError, ShoppingListService,
    ToggleAction, UpdateSemantics,
};
use foodgram_core::{RelationKind, Slug, TagId};
use foodgram_integration_tests::{
    create_ingredient, create_tag, create_user, draft, line, test_images, test_pool, unique,
};

const PAGE: PageRequest = PageRequest { page: 1, limit: 50 };

fn field_of(result: Result<impl std::fmt::Debug, ServiceError>) -> String {
    match result {
        Err(ServiceError::Validation(e)) => e.field,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// =============================================================================
// Composition
// =============================================================================

#[tokio::test]
async fn test_create_stores_ingredients_and_tags() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let (flour, _) = create_ingredient(&pool, "flour", "g").await;
    let (milk, _) = create_ingredient(&pool, "milk", "ml").await;
    let (breakfast, _) = create_tag(&pool).await;
    let (sweet, _) = create_tag(&pool).await;

    let recipe = RecipeService::new(&pool, &images)
        .create(
            author,
            &draft(
                "Pancakes",
                vec![line(flour, 200), line(milk, 300)],
                vec![breakfast, sweet],
            ),
        )
        .await
        .unwrap();

    assert_eq!(recipe.author.id, author);
    assert_eq!(recipe.ingredients.len(), 2);
    let mut tags: Vec<TagId> = recipe.tags.iter().map(|t| t.id).collect();
    tags.sort_unstable_by_key(TagId::as_i32);
    let mut expected = vec![breakfast, sweet];
    expected.sort_unstable_by_key(TagId::as_i32);
    assert_eq!(tags, expected);
    assert!(!recipe.is_favorited);
}

#[tokio::test]
async fn test_duplicate_ingredient_rejected_and_nothing_stored() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let (flour, _) = create_ingredient(&pool, "flour", "g").await;
    let (tag, _) = create_tag(&pool).await;

    let result = RecipeService::new(&pool, &images)
        .create(
            author,
            &draft("Twice", vec![line(flour, 100), line(flour, 50)], vec![tag]),
        )
        .await;

    match result {
        Err(ServiceError::Validation(e)) => {
            assert_eq!(e.field, "ingredients");
            assert!(e.message.contains(&flour.to_string()));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }

    let stored: i64 =
        sqlx::query_scalar("SELECT count(*) FROM foodgram.recipe WHERE author_id = $1")
            .bind(author)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_unknown_references_rejected() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let (flour, _) = create_ingredient(&pool, "flour", "g").await;
    let (tag, _) = create_tag(&pool).await;
    let recipes = RecipeService::new(&pool, &images);

    let missing_tag = recipes
        .create(
            author,
            &draft("Lost", vec![line(flour, 1)], vec![tag, TagId::new(i32::MAX)]),
        )
        .await;
    assert_eq!(field_of(missing_tag), "tags");

    let missing_ingredient = recipes
        .create(
            author,
            &draft(
                "Lost",
                vec![line(foodgram_core::IngredientId::new(i32::MAX), 1)],
                vec![tag],
            ),
        )
        .await;
    assert_eq!(field_of(missing_ingredient), "ingredients");
}

#[tokio::test]
async fn test_partial_update_keeps_absent_sets() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let (flour, _) = create_ingredient(&pool, "flour", "g").await;
    let (sugar, _) = create_ingredient(&pool, "sugar", "g").await;
    let (tag, _) = create_tag(&pool).await;
    let (other_tag, _) = create_tag(&pool).await;
    let recipes = RecipeService::new(&pool, &images);

    let recipe = recipes
        .create(author, &draft("Cake", vec![line(flour, 250)], vec![tag]))
        .await
        .unwrap();

    let renamed = recipes
        .update(
            author,
            recipe.id,
            UpdateSemantics::Partial,
            &RecipeChanges {
                name: Some("Sponge cake".to_owned()),
                ..RecipeChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Sponge cake");
    assert_eq!(renamed.ingredients, recipe.ingredients);
    assert_eq!(renamed.tags, recipe.tags);

    let replaced = recipes
        .update(
            author,
            recipe.id,
            UpdateSemantics::Partial,
            &RecipeChanges {
                ingredients: Some(vec![line(sugar, 100)]),
                tags: Some(vec![other_tag]),
                ..RecipeChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.name, "Sponge cake");
    assert_eq!(replaced.ingredients.len(), 1);
    assert_eq!(replaced.ingredients[0].id, sugar);
    assert_eq!(replaced.tags.len(), 1);
    assert_eq!(replaced.tags[0].id, other_tag);
}

#[tokio::test]
async fn test_full_replace_and_foreign_updates_refused() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let stranger = create_user(&pool).await;
    let (flour, _) = create_ingredient(&pool, "flour", "g").await;
    let (tag, _) = create_tag(&pool).await;
    let recipes = RecipeService::new(&pool, &images);

    let recipe = recipes
        .create(author, &draft("Scones", vec![line(flour, 300)], vec![tag]))
        .await
        .unwrap();

    let put = recipes
        .update(
            author,
            recipe.id,
            UpdateSemantics::FullReplace,
            &RecipeChanges::default(),
        )
        .await;
    assert!(matches!(put, Err(ServiceError::MethodNotAllowed("PUT"))));

    let foreign = recipes
        .update(
            stranger,
            recipe.id,
            UpdateSemantics::Partial,
            &RecipeChanges::default(),
        )
        .await;
    assert!(matches!(foreign, Err(ServiceError::PermissionDenied)));

    let foreign_delete = recipes.delete(stranger, recipe.id).await;
    assert!(matches!(foreign_delete, Err(ServiceError::PermissionDenied)));
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_filters_by_author_tags_and_favorites() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let reader = create_user(&pool).await;
    let (flour, _) = create_ingredient(&pool, "flour", "g").await;
    let (lunch, lunch_slug) = create_tag(&pool).await;
    let (dinner, dinner_slug) = create_tag(&pool).await;
    let (snack, _) = create_tag(&pool).await;
    let recipes = RecipeService::new(&pool, &images);

    let soup = recipes
        .create(author, &draft("Soup", vec![line(flour, 10)], vec![lunch]))
        .await
        .unwrap();
    let stew = recipes
        .create(author, &draft("Stew", vec![line(flour, 20)], vec![dinner]))
        .await
        .unwrap();
    recipes
        .create(author, &draft("Crisps", vec![line(flour, 30)], vec![snack]))
        .await
        .unwrap();

    let by_author = RecipeFilter {
        author: Some(author),
        ..RecipeFilter::default()
    };

    let all = recipes.list(by_author.clone(), None, PAGE).await.unwrap();
    assert_eq!(all.count, 3);

    let lunch_or_dinner = RecipeFilter {
        tags: vec![
            Slug::parse(&lunch_slug).unwrap(),
            Slug::parse(&dinner_slug).unwrap(),
        ],
        ..by_author.clone()
    };
    let tagged = recipes.list(lunch_or_dinner, None, PAGE).await.unwrap();
    let names: Vec<&str> = tagged.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Stew", "Soup"]);

    RelationService::new(&pool, &images)
        .toggle(
            reader,
            RelationKind::Favorite,
            RelationTarget::Recipe(soup.id),
            ToggleAction::Add,
        )
        .await
        .unwrap();

    let favorites = RecipeFilter {
        is_favorited: true,
        ..by_author
    };
    let mine = recipes
        .list(favorites.clone(), Some(reader), PAGE)
        .await
        .unwrap();
    assert_eq!(mine.count, 1);
    assert_eq!(mine.results[0].id, soup.id);
    assert!(mine.results[0].is_favorited);

    let anonymous = recipes.list(favorites, None, PAGE).await.unwrap();
    assert_eq!(anonymous.count, 3);
    assert!(anonymous.results.iter().any(|r| r.id == stew.id));
}

#[tokio::test]
async fn test_ingredient_search_puts_prefix_matches_first() {
    let Some(pool) = test_pool().await else { return };
    let token = unique();
    let inside = format!("cheese{token}");
    let prefix = format!("{token}cake");

    let inserted = IngredientRepository::new(&pool)
        .load(&[
            (inside.clone(), "g".to_owned()),
            (prefix.clone(), "pc".to_owned()),
        ])
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let found = IngredientRepository::new(&pool)
        .search(Some(&token.to_uppercase()))
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec![prefix.as_str(), inside.as_str()]);

    let reloaded = IngredientRepository::new(&pool)
        .load(&[(prefix, "pc".to_owned())])
        .await
        .unwrap();
    assert_eq!(reloaded, 0);
}

// =============================================================================
// Shopping list
// =============================================================================

#[tokio::test]
async fn test_shopping_list_sums_across_recipes() {
    let Some(pool) = test_pool().await else { return };
    let images = test_images();
    let author = create_user(&pool).await;
    let shopper = create_user(&pool).await;
    let (flour, flour_name) = create_ingredient(&pool, "flour", "g").await;
    let (sugar, sugar_name) = create_ingredient(&pool, "sugar", "g").await;
    let (egg, egg_name) = create_ingredient(&pool, "egg", "pc").await;
    let (tag, _) = create_tag(&pool).await;
    let recipes = RecipeService::new(&pool, &images);

    let a = recipes
        .create(
            author,
            &draft("A", vec![line(flour, 100), line(sugar, 50)], vec![tag]),
        )
        .await
        .unwrap();
    let b = recipes
        .create(
            author,
            &draft("B", vec![line(flour, 200), line(egg, 2)], vec![tag]),
        )
        .await
        .unwrap();

    let shopping = ShoppingListService::new(&pool);
    assert_eq!(shopping.csv(shopper).await.unwrap(), "");

    let relations = RelationService::new(&pool, &images);
    for id in [a.id, b.id] {
        relations
            .toggle(
                shopper,
                RelationKind::ShoppingCart,
                RelationTarget::Recipe(id),
                ToggleAction::Add,
            )
            .await
            .unwrap();
    }

    let csv = shopping.csv(shopper).await.unwrap();
    assert_eq!(
        csv,
        format!("{egg_name},2,pc\n{flour_name},300,g\n{sugar_name},50,g\n")
    );
}
