//! gRPC Service Implementation
//!
//! Implements the `Greeter` and `Blog` services from `proto/`. Every method
//! runs its body through the gRPC [`MiddlewareChain`] and delegates to the
//! same service layer the HTTP routes use.

use std::sync::Arc;

use tonic::service::Routes;
use tonic::{Request, Response, Status};

use duplex_core::{Article, ArticleId, Page};

use crate::error::ApiError;
use crate::middleware::MiddlewareChain;
use crate::services::{BlogService, GreeterService};

// Include the generated protobuf code
pub mod proto {
    pub mod helloworld {
        tonic::include_proto!("duplex.helloworld.v1");
    }

    pub mod blog {
        tonic::include_proto!("duplex.blog.v1");
    }
}

use proto::blog::{
    blog_server, CreateArticleRequest, GetArticleRequest, GetLikeReply, GetLikeRequest,
    IncLikeReply, IncLikeRequest, ListArticlesReply, ListArticlesRequest,
};
use proto::helloworld::{
    greeter_server, HelloReply, HelloRequest, SetGreetingReply, SetGreetingRequest,
};

// ============================================================================
// OPERATION NAMES
// ============================================================================

pub const SAY_HELLO: &str = "/duplex.helloworld.v1.Greeter/SayHello";
pub const SET_GREETING: &str = "/duplex.helloworld.v1.Greeter/SetGreeting";
pub const CREATE_ARTICLE: &str = "/duplex.blog.v1.Blog/CreateArticle";
pub const GET_ARTICLE: &str = "/duplex.blog.v1.Blog/GetArticle";
pub const LIST_ARTICLES: &str = "/duplex.blog.v1.Blog/ListArticles";
pub const GET_LIKE: &str = "/duplex.blog.v1.Blog/GetLike";
pub const INC_LIKE: &str = "/duplex.blog.v1.Blog/IncLike";

// ============================================================================
// CONVERSION HELPERS
// ============================================================================

fn article_to_proto(article: Article, like: Option<i64>) -> proto::blog::Article {
    proto::blog::Article {
        id: article.id.get(),
        title: article.title,
        content: article.content,
        like,
        created_at: article.created_at.timestamp_millis(),
        updated_at: article.updated_at.timestamp_millis(),
    }
}

// ============================================================================
// GREETER SERVICE IMPLEMENTATION
// ============================================================================

pub struct GreeterServiceImpl {
    greeter: Arc<GreeterService>,
    chain: Arc<MiddlewareChain>,
}

impl GreeterServiceImpl {
    pub fn new(greeter: Arc<GreeterService>, chain: Arc<MiddlewareChain>) -> Self {
        Self { greeter, chain }
    }
}

#[tonic::async_trait]
impl greeter_server::Greeter for GreeterServiceImpl {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        let req = request.into_inner();
        let message = self
            .chain
            .run(SAY_HELLO, async move {
                self.greeter.say_hello(&req.name).await.map_err(ApiError::from)
            })
            .await?;
        Ok(Response::new(HelloReply { message }))
    }

    async fn set_greeting(
        &self,
        request: Request<SetGreetingRequest>,
    ) -> Result<Response<SetGreetingReply>, Status> {
        let req = request.into_inner();
        let greeting = self
            .chain
            .run(SET_GREETING, async move {
                self.greeter
                    .set_greeting(&req.name, &req.message)
                    .await
                    .map_err(ApiError::from)
            })
            .await?;
        Ok(Response::new(SetGreetingReply {
            name: greeting.name,
            message: greeting.message,
        }))
    }
}

// ============================================================================
// BLOG SERVICE IMPLEMENTATION
// ============================================================================

pub struct BlogServiceImpl {
    blog: Arc<BlogService>,
    chain: Arc<MiddlewareChain>,
}

impl BlogServiceImpl {
    pub fn new(blog: Arc<BlogService>, chain: Arc<MiddlewareChain>) -> Self {
        Self { blog, chain }
    }
}

#[tonic::async_trait]
impl blog_server::Blog for BlogServiceImpl {
    async fn create_article(
        &self,
        request: Request<CreateArticleRequest>,
    ) -> Result<Response<proto::blog::Article>, Status> {
        let req = request.into_inner();
        let article = self
            .chain
            .run(CREATE_ARTICLE, async move {
                let new = duplex_core::NewArticle::new(req.title, req.content);
                self.blog.create_article(new).await.map_err(ApiError::from)
            })
            .await?;
        Ok(Response::new(article_to_proto(article, None)))
    }

    async fn get_article(
        &self,
        request: Request<GetArticleRequest>,
    ) -> Result<Response<proto::blog::Article>, Status> {
        let req = request.into_inner();
        let liked = self
            .chain
            .run(GET_ARTICLE, async move {
                let id = ArticleId::parse(req.id)?;
                let liked = self.blog.get_article(id).await?;
                Ok::<_, ApiError>(liked)
            })
            .await?;
        Ok(Response::new(article_to_proto(liked.article, Some(liked.likes))))
    }

    async fn list_articles(
        &self,
        request: Request<ListArticlesRequest>,
    ) -> Result<Response<ListArticlesReply>, Status> {
        let req = request.into_inner();
        let articles = self
            .chain
            .run(LIST_ARTICLES, async move {
                let page = Page::from_parts(req.limit, req.offset)?;
                let articles = self.blog.list_articles(page).await?;
                Ok::<_, ApiError>(articles)
            })
            .await?;
        Ok(Response::new(ListArticlesReply {
            articles: articles
                .into_iter()
                .map(|article| article_to_proto(article, None))
                .collect(),
        }))
    }

    async fn get_like(
        &self,
        request: Request<GetLikeRequest>,
    ) -> Result<Response<GetLikeReply>, Status> {
        let req = request.into_inner();
        let (id, count) = self
            .chain
            .run(GET_LIKE, async move {
                let id = ArticleId::parse(req.id)?;
                let count = self.blog.get_like(id).await?;
                Ok::<_, ApiError>((id, count))
            })
            .await?;
        Ok(Response::new(GetLikeReply {
            id: id.get(),
            count,
        }))
    }

    async fn inc_like(
        &self,
        request: Request<IncLikeRequest>,
    ) -> Result<Response<IncLikeReply>, Status> {
        let req = request.into_inner();
        self.chain
            .run(INC_LIKE, async move {
                let id = ArticleId::parse(req.id)?;
                self.blog.inc_like(id).await?;
                Ok::<_, ApiError>(())
            })
            .await?;
        Ok(Response::new(IncLikeReply {}))
    }
}

// ============================================================================
// ROUTES
// ============================================================================

/// Both services behind one gRPC router, sharing `chain`.
pub fn create_routes(
    greeter: Arc<GreeterService>,
    blog: Arc<BlogService>,
    chain: Arc<MiddlewareChain>,
) -> Routes {
    Routes::new(greeter_server::GreeterServer::new(GreeterServiceImpl::new(
        greeter,
        Arc::clone(&chain),
    )))
    .add_service(blog_server::BlogServer::new(BlogServiceImpl::new(blog, chain)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_article_to_proto_uses_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap_or_default();
        let article = Article {
            id: ArticleId::new(42),
            title: "t".to_string(),
            content: "c".to_string(),
            created_at: at,
            updated_at: at,
        };
        let proto = article_to_proto(article, Some(3));
        assert_eq!(proto.id, 42);
        assert_eq!(proto.like, Some(3));
        assert_eq!(proto.created_at, 1_700_000_000_123);
    }

    #[test]
    fn test_operation_names_match_service_paths() {
        use tonic::server::NamedService;
        let greeter = <greeter_server::GreeterServer<GreeterServiceImpl> as NamedService>::NAME;
        let blog = <blog_server::BlogServer<BlogServiceImpl> as NamedService>::NAME;
        assert!(SAY_HELLO.starts_with(&format!("/{}/", greeter)));
        assert!(INC_LIKE.starts_with(&format!("/{}/", blog)));
    }
}
