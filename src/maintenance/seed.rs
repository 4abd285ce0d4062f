//! Sample catalog for local development and demos.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use prerna_db::RepositoryError;

use crate::modules::categories::repository::CategoryRepository;
use crate::modules::content::models::{DispatchVideo, InfluencerVideo};
use crate::modules::content::repository::ContentRepository;
use crate::modules::new_id;
use crate::modules::products::models::{ProductDraft, ProductSpecs};
use crate::modules::products::repository::ProductRepository;
use crate::modules::reviews::models::NewReview;
use crate::modules::reviews::repository::ReviewRepository;
use crate::utils::{slug::slugify, video};

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    color: &'static str,
    fabric: &'static str,
}

struct SampleCategory {
    name: &'static str,
    products: &'static [SampleProduct],
}

const CATALOG: &[SampleCategory] = &[
    SampleCategory {
        name: "Banarasi Silk",
        products: &[
            SampleProduct {
                name: "Crimson Zari Banarasi",
                description: "Handwoven Banarasi silk with a heavy zari pallu.",
                price: 18500,
                color: "Crimson",
                fabric: "Katan Silk",
            },
            SampleProduct {
                name: "Emerald Butidar Banarasi",
                description: "Deep green silk scattered with gold butis.",
                price: 16200,
                color: "Emerald",
                fabric: "Katan Silk",
            },
        ],
    },
    SampleCategory {
        name: "Cotton Handloom",
        products: &[SampleProduct {
            name: "Indigo Jamdani Cotton",
            description: "Breathable handloom cotton with jamdani motifs.",
            price: 4800,
            color: "Indigo",
            fabric: "Cotton",
        }],
    },
];

const SAMPLE_REVIEWERS: &[(&str, i64, &str)] = &[
    ("Ananya", 5, "The drape is beautiful and the zari is even richer in person."),
    ("Meera", 4, "Lovely colour, delivery took a few extra days."),
];

const SAMPLE_YOUTUBE_ID: &str = "dQw4w9WgXcQ";

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub skipped: bool,
    pub categories: usize,
    pub products: usize,
    pub reviews: usize,
}

fn placeholder_image(folder: &str, slug: &str) -> String {
    format!("/uploads/{folder}/{slug}.jpg")
}

/// Insert the sample catalog into an empty database.
///
/// Does nothing when any category already exists.
pub async fn seed_catalog(pool: &SqlitePool) -> Result<SeedReport, RepositoryError> {
    let categories = CategoryRepository::new(pool);
    if !categories.list_all().await?.is_empty() {
        tracing::info!("catalog already has data; skipping seed");
        return Ok(SeedReport {
            skipped: true,
            ..Default::default()
        });
    }

    let products = ProductRepository::new(pool);
    let reviews = ReviewRepository::new(pool);
    let mut report = SeedReport::default();
    let mut hero_images = Vec::new();

    for sample in CATALOG {
        let slug = slugify(sample.name);
        let category = categories
            .create(new_id(), sample.name, &slug, &placeholder_image("categories", &slug))
            .await?;
        report.categories += 1;

        for item in sample.products {
            let image = placeholder_image("products", &slugify(item.name));
            let draft = ProductDraft {
                name: item.name.to_string(),
                description: item.description.to_string(),
                price: Decimal::from(item.price),
                category_id: category.id,
                images: vec![image.clone()],
                specs: ProductSpecs {
                    color: Some(item.color.to_string()),
                    fabric: Some(item.fabric.to_string()),
                    ..Default::default()
                },
            };
            let product = products.create(new_id(), &draft).await?;
            report.products += 1;
            hero_images.push(image);

            for (user_name, rating, comment) in SAMPLE_REVIEWERS {
                let review = reviews
                    .create(
                        new_id(),
                        &NewReview {
                            product_id: product.id,
                            rating: *rating,
                            user_name: user_name.to_string(),
                            user_image: None,
                            video_link: None,
                            comment: Some(comment.to_string()),
                            images: Vec::new(),
                        },
                    )
                    .await?;
                reviews.moderate(review.id, Some(true), Some(*rating == 5)).await?;
                report.reviews += 1;
            }
        }
    }

    let youtube_url = format!("https://www.youtube.com/watch?v={SAMPLE_YOUTUBE_ID}");
    ContentRepository::new(pool)
        .modify(|content| {
            content.hero_images = hero_images;
            content.influencer_videos = vec![InfluencerVideo {
                id: new_id(),
                url: youtube_url.clone(),
                creator_name: "Prerna Stories".to_string(),
                review_summary: Some("Styling three drapes from the silk edit.".to_string()),
            }];
            content.dispatch_videos = vec![DispatchVideo {
                id: new_id(),
                url: youtube_url.clone(),
                thumbnail: video::youtube_thumbnail(SAMPLE_YOUTUBE_ID),
            }];
        })
        .await?;

    tracing::info!(
        categories = report.categories,
        products = report.products,
        reviews = report.reviews,
        "sample catalog seeded"
    );
    Ok(report)
}
