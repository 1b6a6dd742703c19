pub mod auth;
pub mod health;
pub mod stats;
pub mod tasks;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").service(auth::login))
        .service(
            // "/me" routes must be registered before the "/{reference}" ones.
            web::scope("/users")
                .service(users::get_me)
                .service(users::update_me)
                .service(users::change_my_password)
                .service(users::create_user)
                .service(users::list_users)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::my_tasks)
                .service(tasks::search_tasks)
                .service(tasks::create_task)
                .service(tasks::list_tasks)
                .service(tasks::change_status)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/stats")
                .service(stats::ping)
                .service(stats::team_counts)
                .service(stats::per_assignee_counts),
        );
}
