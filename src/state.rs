use crate::config::AppConfig;
use crate::services::scheduling::ScheduleService;

pub struct AppState {
    pub schedules: ScheduleService,
    pub config: AppConfig,
}
