use crate::{
    client::{ClientError, ClientResult, FeedParams, ForumClient},
    models::{FeedPost, FeedScope},
};

/// Infinite-scroll state: the posts shown so far and the next page to ask
/// for. The first page comes from the server-rendered HTML.
#[derive(Debug, Clone)]
pub struct PostFeed {
    posts: Vec<FeedPost>,
    forum_name: Option<String>,
    tag: Option<String>,
    scope: Option<FeedScope>,
    page_size: u32,
    next_page: u32,
    exhausted: bool,
}

impl PostFeed {
    pub fn new(
        initial_posts: Vec<FeedPost>,
        forum_name: Option<String>,
        tag: Option<String>,
        page_size: u32,
    ) -> Self {
        Self {
            posts: initial_posts,
            forum_name,
            tag: tag.filter(|tag| !tag.is_empty()),
            scope: None,
            page_size,
            next_page: 2,
            exhausted: false,
        }
    }

    pub fn following(mut self) -> Self {
        self.scope = Some(FeedScope::Following);
        self
    }

    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn params(&self) -> FeedParams {
        FeedParams {
            limit: self.page_size,
            page: self.next_page,
            forum_name: self.forum_name.clone(),
            tag: self.tag.clone(),
            feed: self.scope,
        }
    }

    /// Appends posts not already shown and returns how many were new.
    pub fn merge_page(&mut self, page: Vec<FeedPost>) -> usize {
        let before = self.posts.len();
        for post in page {
            if !self.posts.iter().any(|shown| shown.id() == post.id()) {
                self.posts.push(post);
            }
        }
        self.next_page += 1;
        self.posts.len() - before
    }

    /// Fetches the next page. A `404` means the feed has run out.
    pub async fn load_more(&mut self, client: &ForumClient) -> ClientResult<usize> {
        if self.exhausted {
            return Ok(0);
        }

        match client.get_posts(&self.params()).await {
            Ok(page) => Ok(self.merge_page(page)),
            Err(ClientError::NotFound(_)) => {
                self.exhausted = true;
                Ok(0)
            }
            Err(error) => Err(error),
        }
    }
}
