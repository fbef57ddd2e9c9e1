use dormhelper_core::db::seed::SAMPLE_NEWS;
use dormhelper_core::{NewsRepository, RepoError, Store, ValidationError};

#[test]
fn seeded_news_is_listed_newest_first() {
    let (store, _) = Store::open_in_memory().unwrap();

    let listed = store.news().list(10).unwrap();

    let titles: Vec<&str> = listed.iter().map(|news| news.title.as_str()).collect();
    let mut expected: Vec<&str> = SAMPLE_NEWS.iter().map(|(title, _)| *title).collect();
    expected.reverse();
    assert_eq!(titles, expected);
}

#[test]
fn added_news_comes_first_and_get_returns_it() {
    let (store, _) = Store::open_in_memory().unwrap();
    let news = store.news();

    let id = news
        .add(" Heating test ", "<b>Radiators</b> will be checked on Friday.")
        .unwrap();

    let listed = news.list(1).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);

    let stored = news.get(id).unwrap().unwrap();
    assert_eq!(stored.title, "Heating test");
    assert_eq!(stored.content, "<b>Radiators</b> will be checked on Friday.");
    assert!(stored.created_at.is_some());
    assert!(news.get(id + 100).unwrap().is_none());
}

#[test]
fn news_rejects_blank_title_and_zero_limit() {
    let (store, _) = Store::open_in_memory().unwrap();
    let news = store.news();

    assert!(matches!(
        news.add("  ", "Body"),
        Err(RepoError::Validation(ValidationError::EmptyField("title")))
    ));
    assert!(matches!(
        news.list(0),
        Err(RepoError::Validation(ValidationError::ZeroLimit))
    ));
}
