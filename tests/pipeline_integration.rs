use std::time::Duration;

use newsdesk::config::{BotConfig, PublishMode, ServiceCredentials};
use newsdesk::contract::{
    Candidate, ImageRef, MockCmsClient, MockEnhancer, MockImageSource, MockSocialClient, PostRef,
    ServiceError, SocialRef,
};
use newsdesk::pipeline::{CategoryCache, ContentItem, ItemPipeline, ItemStatus, Stage};

fn creds() -> ServiceCredentials {
    ServiceCredentials {
        base_url: "http://localhost".to_string(),
        token: "test-token".to_string(),
    }
}

fn test_config() -> BotConfig {
    BotConfig {
        content: creds(),
        images: creds(),
        enhancer: creds(),
        cms: creds(),
        social: Some(creds()),
        publish_mode: PublishMode::Live,
        include_images: true,
        announce: true,
        item_delay: Duration::ZERO,
        group_delay: Duration::ZERO,
        word_target: 400,
        excerpt_words: 50,
        social_char_limit: 280,
    }
}

fn candidate(title: &str, url: &str, group: &str) -> Candidate {
    Candidate {
        title: title.to_string(),
        body: format!("Body for {title}"),
        url: Some(url.to_string()),
        group: group.to_string(),
    }
}

fn image() -> ImageRef {
    ImageRef {
        url: "https://images.example/large.jpg".to_string(),
        attribution: Some("Alex Photographer".to_string()),
        attribution_url: None,
        width: 1920,
        height: 1080,
    }
}

fn post_ref() -> PostRef {
    PostRef {
        id: 11,
        url: "https://cms.example/2026/article".to_string(),
        status: "publish".to_string(),
    }
}

#[tokio::test]
async fn publishes_without_image_when_source_finds_none() {
    let config = test_config();

    let mut images = MockImageSource::new();
    // Group query plus title-keyword query both come back empty.
    images.expect_find().returning(|_, _| Ok(None));

    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|title, _, _| Ok(format!("<p>{title}</p>")));
    enhancer
        .expect_summarize()
        .returning(|_, _| Ok("a short excerpt".to_string()));
    enhancer
        .expect_draft_social_post()
        .returning(|_, _, _| Ok("Short announcement #news".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_resolve_or_create_category().returning(|_| Ok(7));
    cms.expect_create_article()
        .withf(|draft| draft.media_id.is_none() && draft.category_id == Some(7))
        .returning(|_| Ok(post_ref()));

    let mut social = MockSocialClient::new();
    social.expect_post().returning(|_, media_id| {
        assert!(media_id.is_none());
        Ok(SocialRef {
            id: "900".to_string(),
            url: "https://x.com/i/web/status/900".to_string(),
        })
    });

    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Quantum Leap Forward",
        "https://source.example/a",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert!(item.is_published());
    assert_eq!(item.status, ItemStatus::Announced);
    assert!(item.media_id.is_none());
    assert!(item.image_skipped);
    assert!(!matches!(item.status, ItemStatus::Failed(_)));
}

#[tokio::test]
async fn enhancement_failure_is_fatal_and_skips_publishing() {
    let config = test_config();

    let mut images = MockImageSource::new();
    images.expect_find().returning(|_, _| Ok(Some(image())));

    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Err(ServiceError::Permanent("model rejected prompt".to_string())));

    // No CMS or social expectations: any call would panic the test.
    let cms = MockCmsClient::new();
    let social = MockSocialClient::new();

    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Doomed Article",
        "https://source.example/b",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert_eq!(item.status, ItemStatus::Failed(Stage::Enhance));
    assert!(item.post.is_none());
    assert!(item
        .errors
        .iter()
        .any(|e| e.stage == Stage::Enhance));
}

#[tokio::test]
async fn media_upload_failure_degrades_to_publish_without_image() {
    let mut config = test_config();
    config.announce = false;

    let mut images = MockImageSource::new();
    images.expect_find().returning(|_, _| Ok(Some(image())));

    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));
    enhancer
        .expect_summarize()
        .returning(|_, _| Ok("excerpt".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_upload_media()
        .returning(|_, _| Err(ServiceError::Transient("503 from media endpoint".to_string())));
    cms.expect_resolve_or_create_category().returning(|_| Ok(3));
    cms.expect_create_article()
        .withf(|draft| draft.media_id.is_none())
        .returning(|_| Ok(post_ref()));

    let social = MockSocialClient::new();
    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Upload Trouble",
        "https://source.example/c",
        "business",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert!(item.is_published());
    assert!(item.media_id.is_none());
    assert!(item.image_skipped);
    assert!(item.errors.iter().any(|e| e.stage == Stage::UploadMedia));
}

#[tokio::test]
async fn category_failure_is_fatal_and_no_article_is_created() {
    let mut config = test_config();
    config.include_images = false;
    config.announce = false;

    let images = MockImageSource::new();
    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_resolve_or_create_category()
        .returning(|_| Err(ServiceError::Permanent("401 unauthorized".to_string())));
    // create_article must never be called; no expectation set.

    let social = MockSocialClient::new();
    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Uncategorisable",
        "https://source.example/d",
        "business",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert_eq!(item.status, ItemStatus::Failed(Stage::Category));
    assert!(item.post.is_none());
}

#[tokio::test]
async fn transient_social_error_leaves_article_published() {
    let config = test_config();

    let mut images = MockImageSource::new();
    images.expect_find().returning(|_, _| Ok(Some(image())));

    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));
    enhancer
        .expect_summarize()
        .returning(|_, _| Ok("excerpt".to_string()));
    enhancer
        .expect_draft_social_post()
        .returning(|_, _, _| Ok("Announcement text".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_upload_media().returning(|_, _| Ok(55));
    cms.expect_resolve_or_create_category().returning(|_| Ok(2));
    cms.expect_create_article().returning(|_| Ok(post_ref()));

    let mut social = MockSocialClient::new();
    social
        .expect_upload_media()
        .returning(|_| Ok("media-1".to_string()));
    social
        .expect_post()
        .returning(|_, _| Err(ServiceError::Transient("rate limited".to_string())));

    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Announced Nowhere",
        "https://source.example/e",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert!(item.is_published());
    assert_eq!(item.status, ItemStatus::Published);
    assert!(item.social_post.is_none());
    assert!(item.tweet_skipped);
    assert!(item.errors.iter().any(|e| e.stage == Stage::Announce));
}

#[tokio::test]
async fn social_media_upload_failure_degrades_to_a_text_only_announcement() {
    let config = test_config();

    let mut images = MockImageSource::new();
    images.expect_find().returning(|_, _| Ok(Some(image())));

    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));
    enhancer
        .expect_summarize()
        .returning(|_, _| Ok("excerpt".to_string()));
    enhancer
        .expect_draft_social_post()
        .returning(|_, _, _| Ok("Announcement text".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_upload_media().returning(|_, _| Ok(55));
    cms.expect_resolve_or_create_category().returning(|_| Ok(2));
    cms.expect_create_article().returning(|_| Ok(post_ref()));

    let mut social = MockSocialClient::new();
    social
        .expect_upload_media()
        .returning(|_| Err(ServiceError::Transient("media endpoint unavailable".to_string())));
    social
        .expect_post()
        .withf(|_, media_id| media_id.is_none())
        .returning(|_, _| {
            Ok(SocialRef {
                id: "902".to_string(),
                url: "https://x.com/i/web/status/902".to_string(),
            })
        });

    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Picture Problems",
        "https://source.example/h",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert_eq!(item.status, ItemStatus::Announced);
    assert!(item.social_post.is_some());
    assert!(!item.tweet_skipped);
    assert!(item.errors.iter().any(|e| e.stage == Stage::Announce));
}

#[tokio::test]
async fn excerpt_word_budget_comes_from_the_config() {
    let mut config = test_config();
    config.include_images = false;
    config.announce = false;
    config.excerpt_words = 25;

    let images = MockImageSource::new();
    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));
    enhancer
        .expect_summarize()
        .withf(|_, max_words| *max_words == 25)
        .returning(|_, _| Ok("short excerpt".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_resolve_or_create_category().returning(|_| Ok(4));
    cms.expect_create_article().returning(|_| Ok(post_ref()));

    let social = MockSocialClient::new();
    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Tight Summary",
        "https://source.example/i",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert!(item.is_published());
    assert_eq!(item.excerpt.as_deref(), Some("short excerpt"));
}

#[tokio::test]
async fn announcement_cap_is_enforced_even_when_the_draft_overruns() {
    let config = test_config();

    let mut images = MockImageSource::new();
    images.expect_find().returning(|_, _| Ok(None));

    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));
    enhancer
        .expect_summarize()
        .returning(|_, _| Ok("excerpt".to_string()));
    // The drafting service ignores its budget entirely.
    enhancer
        .expect_draft_social_post()
        .returning(|_, _, _| Ok("x".repeat(10_000)));

    let mut cms = MockCmsClient::new();
    cms.expect_resolve_or_create_category().returning(|_| Ok(2));
    cms.expect_create_article().returning(|_| Ok(post_ref()));

    let mut social = MockSocialClient::new();
    social
        .expect_post()
        .withf(|text, _| text.chars().count() <= 280 && text.contains("..."))
        .returning(|_, _| {
            Ok(SocialRef {
                id: "901".to_string(),
                url: "https://x.com/i/web/status/901".to_string(),
            })
        });

    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Verbose Model",
        "https://source.example/f",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;

    assert_eq!(item.status, ItemStatus::Announced);
}

#[tokio::test]
async fn reprocessing_a_published_item_is_a_no_op() {
    let mut config = test_config();
    config.include_images = false;
    config.announce = false;

    let images = MockImageSource::new();
    let mut enhancer = MockEnhancer::new();
    enhancer
        .expect_enhance()
        .times(1)
        .returning(|_, _, _| Ok("<p>body</p>".to_string()));
    enhancer
        .expect_summarize()
        .times(1)
        .returning(|_, _| Ok("excerpt".to_string()));

    let mut cms = MockCmsClient::new();
    cms.expect_resolve_or_create_category()
        .times(1)
        .returning(|_| Ok(9));
    cms.expect_create_article().times(1).returning(|_| Ok(post_ref()));

    let social = MockSocialClient::new();
    let pipeline = ItemPipeline {
        config: &config,
        images: &images,
        enhancer: &enhancer,
        cms: &cms,
        social: Some(&social),
    };

    let mut item = ContentItem::from_candidate(candidate(
        "Run Twice",
        "https://source.example/g",
        "technology",
    ));
    let mut cache = CategoryCache::new();
    pipeline.process(&mut item, &mut cache).await;
    assert!(item.is_published());
    let first_post_id = item.post.as_ref().map(|p| p.id);

    // Second pass must not touch any adapter (the mocks enforce times(1)).
    pipeline.process(&mut item, &mut cache).await;
    assert_eq!(item.post.as_ref().map(|p| p.id), first_post_id);
    assert_eq!(item.status, ItemStatus::Published);
}
