use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Round Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::identity::issue_identity,
        crate::routes::teams::register_team,
        crate::routes::teams::list_teams,
        crate::routes::teams::join_team,
        crate::routes::teams::current_membership,
        crate::routes::round::round_summary,
        crate::routes::round::quiz_view,
        crate::routes::round::flow_snapshot,
        crate::routes::round::submit_answer,
        crate::routes::round::quiz_answers,
        crate::routes::admin::seed_round,
        crate::routes::admin::start_round,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::identity::IdentityResponse,
            crate::dto::team::RegisterTeamRequest,
            crate::dto::team::JoinTeamRequest,
            crate::dto::team::TeamSummary,
            crate::dto::team::TeamsResponse,
            crate::dto::team::MembershipResponse,
            crate::dto::quiz::QuizView,
            crate::dto::quiz::RoundSummary,
            crate::dto::flow::VisibleFlowPhase,
            crate::dto::flow::FlowSnapshotResponse,
            crate::dto::answer::SubmitAnswerRequest,
            crate::dto::answer::AdvanceDirective,
            crate::dto::answer::SubmitAnswerResponse,
            crate::dto::answer::AnswerRecord,
            crate::dto::answer::AnswersResponse,
            crate::dto::admin::QuizInput,
            crate::dto::admin::SeedRoundRequest,
            crate::dto::admin::SeedRoundResponse,
            crate::dto::admin::StartRoundResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::RoundStartedEvent,
            crate::dto::sse::RoundSeededEvent,
            crate::dto::sse::TeamCreatedEvent,
            crate::dto::sse::TeamJoinedEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "identity", description = "Session identity issuance"),
        (name = "teams", description = "Team registration and membership"),
        (name = "round", description = "Active round, quiz views and answers"),
        (name = "admin", description = "Round seeding and start signal"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
