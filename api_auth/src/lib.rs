use middleware::auth::AuthMiddleware;

pub mod middleware {
    pub mod auth;
}

// Auth middleware
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}
