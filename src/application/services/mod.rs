pub mod media_fetcher;
pub mod recommendation_service;
pub mod scraper;
