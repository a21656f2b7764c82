/**
 * API Route Handlers
 *
 * # Public
 * - `GET /` - greeting, doubles as health check
 * - `POST /v1/auth`, `POST /v1/auth/signup`, `POST /v1/auth/otp`,
 *   `POST /v1/auth/verify`, `PATCH /v1/auth/reset`
 *
 * # Protected (JWT required)
 * Everything under `/v1/users`, `/v1/rooms`, `/v1/bills`,
 * `/v1/transactions`, `/v1/notifications` and `/v1/subscriptions`.
 * Room routes that need attendance also pass the room guard.
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};

use crate::backend::middleware::{auth_middleware, require_room_member};
use crate::backend::server::state::AppState;
use crate::backend::{auth, bills, friends, messages, notifications, rooms, subscription, transactions, users};

pub const GREETING: &str = "Hello from JustJio API!";

async fn greeting() -> &'static str {
    GREETING
}

/// Routes reachable without a token
pub fn configure_public_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/", get(greeting))
        .route("/v1/auth", post(auth::login))
        .route("/v1/auth/signup", post(auth::signup))
        .route("/v1/auth/otp", post(auth::send_otp))
        .route("/v1/auth/verify", post(auth::verify_otp))
        .route("/v1/auth/reset", patch(auth::reset_password))
}

/// Routes behind the auth middleware
pub fn configure_protected_routes(state: AppState) -> Router<AppState> {
    let room_guard = from_fn_with_state(state.clone(), require_room_member);

    let users = Router::new()
        .route(
            "/v1/users/{userId}",
            get(users::handlers::get_user)
                .patch(users::handlers::update_user)
                .delete(users::handlers::delete_user),
        )
        .route("/v1/users/{userId}/friends", get(friends::handlers::get_friends))
        .route("/v1/users/{userId}/friends/count", get(friends::handlers::count_friends))
        .route("/v1/users/{userId}/friends/check", post(friends::handlers::check_friend))
        .route("/v1/users/{userId}/friends/{friendId}", delete(friends::handlers::remove_friend))
        .route(
            "/v1/users/{userId}/friendRequests",
            get(friends::handlers::get_friend_requests)
                .post(friends::handlers::send_friend_request)
                .patch(friends::handlers::respond_to_friend_request),
        )
        .route(
            "/v1/users/{userId}/friendRequests/count",
            get(friends::handlers::count_friend_requests),
        )
        .route(
            "/v1/users/{userId}/notifications/{id}",
            get(notifications::handlers::get_notification).patch(notifications::handlers::mark_notification_read),
        );

    // Method layers only wrap the methods added before them, so invite
    // answers and direct joins stay outside the guard.
    let rooms = Router::new()
        .route("/v1/rooms", get(rooms::handlers::get_rooms).post(rooms::handlers::create_room))
        .route("/v1/rooms/count", get(rooms::handlers::count_rooms))
        .route("/v1/rooms/invites", get(rooms::handlers::get_invites))
        .route("/v1/rooms/invites/count", get(rooms::handlers::count_invites))
        .route(
            "/v1/rooms/{roomId}",
            get(rooms::handlers::get_room)
                .post(rooms::handlers::invite_users)
                .route_layer(room_guard.clone())
                .patch(rooms::handlers::respond_to_invite),
        )
        .route("/v1/rooms/{roomId}/join", patch(rooms::handlers::join_room))
        .route(
            "/v1/rooms/{roomId}/attendees",
            get(rooms::handlers::get_attendees).route_layer(room_guard.clone()),
        )
        .route(
            "/v1/rooms/{roomId}/close",
            patch(rooms::handlers::close_room).route_layer(room_guard.clone()),
        )
        .route(
            "/v1/rooms/{roomId}/leave",
            patch(rooms::handlers::leave_room).route_layer(room_guard.clone()),
        )
        .route(
            "/v1/rooms/{roomId}/messages",
            get(messages::handlers::get_messages)
                .post(messages::handlers::create_message)
                .route_layer(room_guard.clone()),
        )
        .route(
            "/v1/rooms/{roomId}/messages/{msgId}",
            get(messages::handlers::get_message).route_layer(room_guard),
        );

    let money = Router::new()
        .route("/v1/bills", get(bills::handlers::get_bills).post(bills::handlers::create_bill))
        .route("/v1/bills/consolidate", post(bills::handlers::consolidate))
        .route("/v1/bills/consolidate/{roomId}", get(bills::handlers::is_consolidated))
        .route("/v1/transactions", get(transactions::handlers::get_transactions))
        .route(
            "/v1/transactions/{txId}/settle",
            patch(transactions::handlers::settle_transaction),
        );

    let notifications = Router::new()
        .route(
            "/v1/notifications",
            get(notifications::handlers::get_notifications).post(notifications::handlers::create_notification),
        )
        .route("/v1/subscriptions", post(subscription::handlers::create_subscription))
        .route(
            "/v1/subscriptions/{key}",
            get(subscription::handlers::get_subscription).delete(subscription::handlers::delete_subscription),
        );

    users
        .merge(rooms)
        .merge(money)
        .merge(notifications)
        .route_layer(from_fn_with_state(state, auth_middleware))
}
