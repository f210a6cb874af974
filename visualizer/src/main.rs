use evroutecore::map::CardAction;
use evroutecore::model::{Coordinate, VehicleType};
use evroutecore::session::insight::INSIGHT_HEADING;
use evroutecore::session::snapshot::{RouteSnapshot, StationSnapshot};
use evroutecore::SessionSnapshot;
use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, Column, Container, Row,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Subscription, Task, Theme,
};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "EV Route Visualizer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_secs(1)).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

fn bridge_url() -> String {
    std::env::var("EVROUTE_BRIDGE_URL").unwrap_or_else(|_| DEFAULT_BRIDGE_URL.to_string())
}

#[derive(Debug)]
struct Visualizer {
    bridge: String,
    snapshot: Option<SessionSnapshot>,
    status: String,
    history: Vec<String>,
    last_summary: String,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    SnapshotFetched(Result<SessionSnapshot, String>),
    Card(CardAction),
    Vehicle(VehicleType),
    GestureSent(Result<String, String>),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let bridge = bridge_url();
        (
            Visualizer {
                bridge: bridge.clone(),
                snapshot: None,
                status: "Waiting for the session...".into(),
                history: Vec::new(),
                last_summary: String::new(),
            },
            Task::perform(fetch_snapshot(bridge), Message::SnapshotFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_snapshot(state.bridge.clone()), Message::SnapshotFetched),
            Message::SnapshotFetched(Ok(snapshot)) => {
                let summary = summarize(&snapshot);
                if summary != state.last_summary {
                    state.push_history(summary.clone());
                    state.last_summary = summary;
                }
                state.status = format!(
                    "Session: {} stations, {} fixes",
                    snapshot.stations.len(),
                    snapshot.metrics.fixes_accepted
                );
                state.snapshot = Some(snapshot);
                Task::none()
            }
            Message::SnapshotFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::Card(CardAction::RouteHere { lat, lon }) => {
                state.push_history(format!("Route to {lat:.4}, {lon:.4}"));
                Task::perform(
                    post_gesture(state.bridge.clone(), "select", SelectBody { lat, lon }),
                    Message::GestureSent,
                )
            }
            Message::Card(CardAction::Optimize {
                name,
                lat,
                lon,
                index,
            }) => {
                state.push_history(format!("Smart Optimize for {name}"));
                Task::perform(
                    post_gesture(
                        state.bridge.clone(),
                        "optimize-station",
                        OptimizeBody {
                            name,
                            lat,
                            lon,
                            index,
                        },
                    ),
                    Message::GestureSent,
                )
            }
            Message::Vehicle(vehicle) => {
                state.push_history(format!("Vehicle set to {vehicle}"));
                Task::perform(
                    post_gesture(
                        state.bridge.clone(),
                        "vehicle",
                        VehicleBody {
                            vehicle: vehicle.as_str(),
                        },
                    ),
                    Message::GestureSent,
                )
            }
            Message::GestureSent(Ok(message)) => {
                state.status = message;
                Task::none()
            }
            Message::GestureSent(Err(err)) => {
                state.status = format!("Gesture error: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let snapshot = state.snapshot.clone().unwrap_or_default();

        let vehicle_row = VehicleType::ALL.iter().fold(
            Row::new().spacing(6),
            |row, vehicle| {
                let label = if *vehicle == snapshot.vehicle {
                    format!("[{vehicle}]")
                } else {
                    vehicle.to_string()
                };
                row.push(button(text(label).size(12)).on_press(Message::Vehicle(*vehicle)).padding(6))
            },
        );

        let notices = snapshot
            .notices
            .iter()
            .fold(Column::new().spacing(4), |col, notice| {
                col.push(text(notice.clone()).size(14).color(Color::from_rgb(0.95, 0.4, 0.35)))
            });

        let station_cards = if snapshot.stations.is_empty() {
            Column::new().push(text("No stations yet").size(12))
        } else {
            snapshot
                .stations
                .iter()
                .fold(Column::new().spacing(10), |col, station| col.push(station_card(station)))
        };

        let insight = column![
            text(INSIGHT_HEADING).size(16),
            text(snapshot.insight.clone().unwrap_or_else(|| "No insight yet".into())).size(12),
        ]
        .spacing(4);

        let side_column = column![
            text("Session").size(26),
            text(snapshot.speed.clone()).size(18),
            text("Vehicle").size(16),
            vehicle_row,
            notices,
            text("Stations").size(16),
            Container::new(scrollable(station_cards).height(Length::Fixed(360.0))).padding(6),
            text(&state.status).size(14),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(380.0));

        let route_line = match &snapshot.route {
            Some(route) => text(format!(
                "Route {:.4},{:.4} -> {:.4},{:.4} ({})",
                route.from.latitude, route.from.longitude, route.to.latitude, route.to.longitude, route.status
            )),
            None => text("No route"),
        }
        .size(14);

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let metrics = &snapshot.metrics;
        let map_column = column![
            text("Map").size(26),
            Canvas::new(MapView::new(&snapshot))
                .width(Length::Fill)
                .height(Length::Fixed(420.0)),
            route_line,
            text(format!(
                "Fixes {} (rejected {}) | station updates {} | reroutes {} | routing failures {} | prediction failures {}",
                metrics.fixes_accepted,
                metrics.fixes_rejected,
                metrics.station_updates,
                metrics.reroutes,
                metrics.routing_failures,
                metrics.optimization_failures
            ))
            .size(12),
            insight,
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(110.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![side_column, map_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn station_card<'a>(station: &StationSnapshot) -> Element<'a, Message> {
    let card = &station.card;
    let actions = card.actions.iter().fold(Row::new().spacing(6), |row, action| {
        let label = match action {
            CardAction::RouteHere { .. } => "Route to here",
            CardAction::Optimize { .. } => "Smart Optimize",
        };
        row.push(
            button(text(label).size(12))
                .on_press(Message::Card(action.clone()))
                .padding(6),
        )
    });
    let panel = station
        .panel
        .iter()
        .fold(Column::new().spacing(2), |col, line| col.push(text(line.clone()).size(12)));

    column![
        text(format!("{} ({})", card.name, card.distance_label)).size(14),
        text(card.comment.clone()).size(12),
        actions,
        panel,
    ]
    .spacing(4)
    .into()
}

fn summarize(snapshot: &SessionSnapshot) -> String {
    let route = snapshot
        .route
        .as_ref()
        .map(|route| route.status.clone())
        .unwrap_or_else(|| "none".into());
    format!(
        "{} stations, route {}, {} notices",
        snapshot.stations.len(),
        route,
        snapshot.notices.len()
    )
}

async fn fetch_snapshot(bridge: String) -> Result<SessionSnapshot, String> {
    let response = reqwest::get(format!("{bridge}/snapshot"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<SessionSnapshot>()
        .await
        .map_err(|e| e.to_string())
}

#[derive(Debug, Serialize)]
struct SelectBody {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct OptimizeBody {
    name: String,
    lat: f64,
    lon: f64,
    index: usize,
}

#[derive(Debug, Serialize)]
struct VehicleBody {
    vehicle: &'static str,
}

async fn post_gesture<B: Serialize + Send + 'static>(bridge: String, path: &'static str, body: B) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{bridge}/{path}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(format!("Sent /{path}"))
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(format!("{}: {}", status, text))
    }
}

fn parse_hex(color: &str) -> Color {
    let hex = color.trim_start_matches('#');
    let channel = |at: usize| hex.get(at..at + 2).and_then(|c| u8::from_str_radix(c, 16).ok());
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::from_rgb8(r, g, b),
        _ => Color::from_rgb(0.0, 0.67, 1.0),
    }
}

/// Equirectangular sketch of the user, stations and route.
#[derive(Clone)]
struct MapView {
    user: Option<Coordinate>,
    stations: Vec<Coordinate>,
    route: Option<RouteSnapshot>,
}

impl MapView {
    fn new(snapshot: &SessionSnapshot) -> Self {
        Self {
            user: snapshot.user,
            stations: snapshot.stations.iter().map(|station| station.position).collect(),
            route: snapshot.route.clone(),
        }
    }

    fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let route_points = self
            .route
            .iter()
            .flat_map(|route| route.path.iter().copied().chain([route.from, route.to]));
        self.user
            .into_iter()
            .chain(self.stations.iter().copied())
            .chain(route_points)
            .fold(None, |extent, point| {
                let (min_lat, max_lat, min_lon, max_lon) = extent.unwrap_or((
                    point.latitude,
                    point.latitude,
                    point.longitude,
                    point.longitude,
                ));
                Some((
                    min_lat.min(point.latitude),
                    max_lat.max(point.latitude),
                    min_lon.min(point.longitude),
                    max_lon.max(point.longitude),
                ))
            })
    }
}

impl canvas::Program<Message> for MapView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.04, 0.05, 0.07),
        );

        let Some((min_lat, max_lat, min_lon, max_lon)) = self.extent() else {
            return vec![frame.into_geometry()];
        };
        let margin = 24.0;
        let span_lat = (max_lat - min_lat).max(1e-4);
        let span_lon = (max_lon - min_lon).max(1e-4);
        let project = |point: Coordinate| {
            let x = (point.longitude - min_lon) / span_lon;
            let y = (point.latitude - min_lat) / span_lat;
            Point::new(
                margin + x as f32 * (bounds.width - 2.0 * margin),
                bounds.height - margin - y as f32 * (bounds.height - 2.0 * margin),
            )
        };

        if let Some(route) = &self.route {
            let points: Vec<Point> = if route.path.len() > 1 {
                route.path.iter().copied().map(project).collect()
            } else {
                Vec::new()
            };
            if let Some((first, rest)) = points.split_first() {
                let path = Path::new(|builder| {
                    builder.move_to(*first);
                    for point in rest {
                        builder.line_to(*point);
                    }
                });
                frame.stroke(
                    &path,
                    Stroke::default()
                        .with_width(4.0)
                        .with_color(parse_hex(&route.color)),
                );
            }
        }

        for station in &self.stations {
            let marker = Path::new(|builder| builder.circle(project(*station), 6.0));
            frame.fill(&marker, Color::from_rgb(0.3, 0.85, 0.45));
        }

        if let Some(user) = self.user {
            let marker = Path::new(|builder| builder.circle(project(user), 8.0));
            frame.fill(&marker, Color::from_rgb(0.95, 0.55, 0.2));
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gesture_bodies_match_the_bridge_fields() {
        let optimize = OptimizeBody {
            name: "Hub".into(),
            lat: 1.0,
            lon: 2.0,
            index: 3,
        };
        assert_eq!(
            serde_json::to_value(&optimize).unwrap(),
            json!({"name": "Hub", "lat": 1.0, "lon": 2.0, "index": 3})
        );
        assert_eq!(
            serde_json::to_value(SelectBody { lat: 1.0, lon: 2.0 }).unwrap(),
            json!({"lat": 1.0, "lon": 2.0})
        );
        assert_eq!(
            serde_json::to_value(VehicleBody {
                vehicle: VehicleType::Truck.as_str()
            })
            .unwrap(),
            json!({"vehicle": "Truck"})
        );
    }

    #[test]
    fn malformed_route_colour_falls_back_to_default_blue() {
        assert_eq!(parse_hex("#00aaff"), Color::from_rgb8(0x00, 0xaa, 0xff));
        assert_eq!(parse_hex("oops"), Color::from_rgb(0.0, 0.67, 1.0));
    }
}
