/// Terminal front end: browse a catalog of models as shaded ASCII
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use nalgebra::Matrix4;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use mv3d_core::{
    ByteSource, Camera, ControlScheme, FetchError, LifecycleState, MemoryNavigation,
    ObjectContainer, RotationState, Transform, Viewer,
};

pub mod renderer;

pub use renderer::AsciiRenderer;

pub type TerminalViewer = Viewer<ObjectContainer, MemoryNavigation>;

const ROTATE_STEP: f32 = 0.1;

/// Reads locators as paths on the local filesystem.
#[derive(Debug, Default)]
pub struct FsSource;

impl ByteSource for FsSource {
    fn fetch(&self, locator: &str, on_done: Box<dyn FnOnce(Result<Vec<u8>, FetchError>)>) {
        on_done(std::fs::read(locator).map_err(|e| FetchError::new(locator, e)));
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    viewer: TerminalViewer,
    rotation: RotationState,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(viewer: TerminalViewer) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        // Last row is the status line
        let rows = height.saturating_sub(1).max(1);

        Ok(Self {
            viewer,
            rotation: RotationState::zero(),
            camera: Camera::new(width as u32, rows as u32 * 2),
            renderer: AsciiRenderer::new(width as usize, rows as usize),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn viewer(&self) -> &TerminalViewer {
        &self.viewer
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        // The initial selection may fail; that is shown in the status line
        let _ = self.viewer.start();
        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            self.update();

            if self.viewer.frame() {
                self.render()?;
                self.frame_count += 1;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => {
                let rows = height.saturating_sub(1).max(1);
                self.renderer.resize(width as usize, rows as usize);
                self.camera.set_viewport(width as u32, rows as u32 * 2);
                self.viewer.resize(width as u32, rows as u32);
                execute!(stdout(), terminal::Clear(ClearType::All))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        let (dx, dy) = match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                return;
            }
            KeyCode::Char('n') => {
                let _ = self.viewer.step_model(true);
                return;
            }
            KeyCode::Char('p') => {
                let _ = self.viewer.step_model(false);
                return;
            }
            KeyCode::Char('m') => {
                self.viewer.step_material();
                return;
            }
            KeyCode::Char('c') => {
                let scheme = self.viewer.settings().controls.toggled();
                self.viewer.set_controls(scheme);
                return;
            }
            KeyCode::Char('+') => {
                self.camera.zoom(0.9);
                self.viewer.mark_dirty();
                return;
            }
            KeyCode::Char('-') => {
                self.camera.zoom(1.1);
                self.viewer.mark_dirty();
                return;
            }
            KeyCode::Char('w') | KeyCode::Up => (-ROTATE_STEP, 0.0),
            KeyCode::Char('s') | KeyCode::Down => (ROTATE_STEP, 0.0),
            KeyCode::Char('a') | KeyCode::Left => (0.0, -ROTATE_STEP),
            KeyCode::Char('d') | KeyCode::Right => (0.0, ROTATE_STEP),
            _ => return,
        };

        match self.viewer.settings().controls {
            ControlScheme::View => self.camera.orbit(-dy, dx),
            ControlScheme::Object => self.rotation.spin(dx, dy),
        }
        self.viewer.mark_dirty();
    }

    fn update(&mut self) {
        // Trackball spin keeps going until damping stops it
        if self.viewer.settings().controls == ControlScheme::Object
            && self.rotation.step(self.viewer.settings().damping)
        {
            self.viewer.mark_dirty();
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let container: Matrix4<f32> = Transform::rotation_matrix(&self.rotation);

        self.renderer.clear();
        for renderable in self.viewer.scene().children() {
            self.renderer.render(renderable, &container, &self.camera);
        }
        if self.viewer.state() == LifecycleState::Loading {
            if let Some(reference) = self.viewer.lifecycle().current() {
                self.renderer.banner(&format!("Loading {}...", reference.name()));
            }
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        let (width, height) = terminal::size()?;
        let status = fit_to_width(&self.status_line(), width as usize);
        queue!(
            stdout,
            cursor::MoveTo(0, height.saturating_sub(1)),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(if self.viewer.last_error().is_some() {
                Color::Red
            } else {
                Color::Yellow
            }),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let settings = self.viewer.settings();
        let mut status = format!(
            "{} [{:?}] | material: {} | controls: {} | FPS: {:.1} | n/p model  m material  c controls  q quit",
            if settings.model.is_empty() { "-" } else { &settings.model },
            self.viewer.state(),
            settings.material,
            settings.controls.name(),
            self.fps,
        );
        if let Some(error) = self.viewer.last_error() {
            status = format!("{error} | {status}");
        }
        status
    }
}

/// Clip a line to `width` columns, never splitting a character.
fn fit_to_width(line: &str, width: usize) -> String {
    line.chars().take(width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fit_to_width_keeps_multibyte_names_whole() {
        let status = "Büste [Attached] | material: Gold";
        assert_eq!(fit_to_width(status, 2), "Bü");
        assert_eq!(fit_to_width(status, 5), "Büste");
        assert_eq!(fit_to_width(status, 200), status);
        assert_eq!(fit_to_width(status, 0), "");
    }

    #[test]
    fn test_fs_source_reports_missing_file() {
        let result = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&result);
        FsSource.fetch(
            "no/such/dir/Büste.stl",
            Box::new(move |fetched| *slot.borrow_mut() = Some(fetched)),
        );
        let error = result.borrow_mut().take().unwrap().unwrap_err();
        assert_eq!(error.locator, "no/such/dir/Büste.stl");
    }
}
