use actix_web::web::{self};

pub mod routes {
    pub mod gate;
}

pub mod services {
    pub mod gate;
    pub mod registry;
}

pub mod dtos {
    pub mod gate;
}

pub use services::registry::GateRegistry;

pub fn mount_gate() -> actix_web::Scope {
    web::scope("/gate")
        .service(routes::gate::get_gate)
        .service(routes::gate::post_navigate)
        .service(routes::gate::post_dismiss)
        .service(routes::gate::delete_gate)
}
pub fn mount_entitlement() -> actix_web::Scope {
    web::scope("/entitlement").service(routes::gate::get_entitlement)
}
