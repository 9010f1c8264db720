use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl SlideDirection {
    pub fn axis(self) -> Axis {
        match self {
            SlideDirection::Left | SlideDirection::Right => Axis::Horizontal,
            SlideDirection::Up | SlideDirection::Down => Axis::Vertical,
        }
    }

    /// slide-in 起始偏移的符号，slide-out 取反
    fn sign(self) -> f64 {
        match self {
            SlideDirection::Left | SlideDirection::Up => 1.0,
            SlideDirection::Right | SlideDirection::Down => -1.0,
        }
    }
}

impl fmt::Display for SlideDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlideDirection::Left => "left",
            SlideDirection::Right => "right",
            SlideDirection::Up => "up",
            SlideDirection::Down => "down",
        };
        f.write_str(name)
    }
}

/// 转场时长不超过片段时长的一半
pub fn transition_window(configured: f64, clip_duration: f64) -> f64 {
    configured.min(clip_duration / 2.0).max(0.0)
}

/// 一个片段的位移动画，单位为图片自身的宽或高。
/// `displacement` 与 `x_expr`/`y_expr` 描述同一条运动曲线
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideMotion {
    pub direction: SlideDirection,
    pub duration: f64,
    pub window: f64,
    pub slide_in: bool,
    pub slide_out: bool,
}

impl SlideMotion {
    pub fn new(
        direction: SlideDirection,
        configured_window: f64,
        duration: f64,
        slide_in: bool,
        slide_out: bool,
    ) -> Self {
        Self {
            direction,
            duration,
            window: transition_window(configured_window, duration),
            slide_in,
            slide_out,
        }
    }

    pub fn is_static(&self) -> bool {
        !(self.slide_in || self.slide_out) || self.window <= 0.0
    }

    fn out_start(&self) -> f64 {
        self.duration - self.window
    }

    /// 时刻 `t` 的偏移量（以图片宽/高为单位，带符号）
    pub fn displacement(&self, t: f64) -> f64 {
        if self.window <= 0.0 {
            return 0.0;
        }
        let sign = self.direction.sign();
        let mut offset = 0.0;

        if self.slide_in && t < self.window {
            offset += sign * (1.0 - t / self.window);
        }
        if self.slide_out && t > self.out_start() {
            let progress = ((t - self.out_start()) / self.window).min(1.0);
            offset -= sign * progress;
        }
        offset
    }

    fn displacement_expr(&self) -> String {
        if self.is_static() {
            return "0".to_string();
        }
        let sign = self.direction.sign();
        let mut terms = Vec::new();

        if self.slide_in {
            terms.push(format!(
                "if(lt(t,{w:.6}),{s}*(1-t/{w:.6}),0)",
                w = self.window,
                s = sign
            ));
        }
        if self.slide_out {
            terms.push(format!(
                "if(gt(t,{start:.6}),{s}*min((t-{start:.6})/{w:.6},1),0)",
                start = self.out_start(),
                w = self.window,
                s = -sign
            ));
        }
        terms.join("+")
    }

    /// ffmpeg overlay 的 `x` 表达式，图片在画布上居中
    pub fn x_expr(&self) -> String {
        match self.direction.axis() {
            Axis::Horizontal if !self.is_static() => {
                format!("(W-w)/2+({})*w", self.displacement_expr())
            }
            _ => "(W-w)/2".to_string(),
        }
    }

    pub fn y_expr(&self) -> String {
        match self.direction.axis() {
            Axis::Vertical if !self.is_static() => {
                format!("(H-h)/2+({})*h", self.displacement_expr())
            }
            _ => "(H-h)/2".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SlideDirection; 4] = [
        SlideDirection::Left,
        SlideDirection::Right,
        SlideDirection::Up,
        SlideDirection::Down,
    ];

    #[test]
    fn window_never_exceeds_half_clip() {
        for configured in [0.1, 0.5, 1.0, 2.5, 10.0, 1000.0] {
            for duration in [0.2, 1.0, 1.9, 4.0, 30.0] {
                let window = transition_window(configured, duration);
                assert!(window <= duration / 2.0);
                assert!(window <= configured);
            }
        }
        assert_eq!(transition_window(1.0, 6.0), 1.0);
        assert_eq!(transition_window(5.0, 3.0), 1.5);
    }

    #[test]
    fn slide_in_is_zero_from_window_on() {
        for direction in ALL {
            let motion = SlideMotion::new(direction, 1.0, 5.0, true, false);
            assert_eq!(motion.displacement(1.0), 0.0);
            for t in [1.0, 1.5, 3.0, 4.99, 5.0] {
                assert_eq!(motion.displacement(t), 0.0);
            }
            assert_eq!(motion.displacement(0.0).abs(), 1.0);
            assert!((motion.displacement(0.5).abs() - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn slide_out_is_zero_until_window_before_end() {
        for direction in ALL {
            let motion = SlideMotion::new(direction, 1.0, 5.0, false, true);
            for t in [0.0, 1.0, 3.999, 4.0] {
                assert_eq!(motion.displacement(t), 0.0);
            }
            assert_eq!(motion.displacement(5.0).abs(), 1.0);
        }
    }

    #[test]
    fn directions_map_to_axis_and_sign() {
        let at = |direction, t| SlideMotion::new(direction, 1.0, 4.0, true, true).displacement(t);

        assert_eq!(SlideDirection::Left.axis(), Axis::Horizontal);
        assert_eq!(SlideDirection::Right.axis(), Axis::Horizontal);
        assert_eq!(SlideDirection::Up.axis(), Axis::Vertical);
        assert_eq!(SlideDirection::Down.axis(), Axis::Vertical);

        // 从正方向滑入，向反方向滑出
        assert_eq!(at(SlideDirection::Left, 0.0), 1.0);
        assert_eq!(at(SlideDirection::Right, 0.0), -1.0);
        assert_eq!(at(SlideDirection::Up, 0.0), 1.0);
        assert_eq!(at(SlideDirection::Down, 0.0), -1.0);

        assert_eq!(at(SlideDirection::Left, 4.0), -1.0);
        assert_eq!(at(SlideDirection::Right, 4.0), 1.0);
        assert_eq!(at(SlideDirection::Up, 4.0), -1.0);
        assert_eq!(at(SlideDirection::Down, 4.0), 1.0);
    }

    #[test]
    fn long_transition_is_clamped_for_short_clip() {
        let motion = SlideMotion::new(SlideDirection::Left, 3.0, 2.0, true, true);
        assert_eq!(motion.window, 1.0);
        assert_eq!(motion.displacement(1.0), 0.0);
        assert!(motion.displacement(0.5) > 0.0);
        assert!(motion.displacement(1.5) < 0.0);
    }

    #[test]
    fn static_clip_has_centred_expressions() {
        let motion = SlideMotion::new(SlideDirection::Up, 1.0, 3.0, false, false);
        assert!(motion.is_static());
        assert_eq!(motion.x_expr(), "(W-w)/2");
        assert_eq!(motion.y_expr(), "(H-h)/2");
    }

    #[test]
    fn expressions_follow_motion() {
        let motion = SlideMotion::new(SlideDirection::Left, 1.0, 4.0, true, true);
        assert_eq!(
            motion.x_expr(),
            "(W-w)/2+(if(lt(t,1.000000),1*(1-t/1.000000),0)\
             +if(gt(t,3.000000),-1*min((t-3.000000)/1.000000,1),0))*w"
        );
        assert_eq!(motion.y_expr(), "(H-h)/2");

        let down = SlideMotion::new(SlideDirection::Down, 0.5, 4.0, true, false);
        assert_eq!(
            down.y_expr(),
            "(H-h)/2+(if(lt(t,0.500000),-1*(1-t/0.500000),0))*h"
        );
        assert_eq!(down.x_expr(), "(W-w)/2");
    }

    /// 求值 `displacement_expr` 用到的那部分 ffmpeg 表达式语法
    struct ExprEval<'a> {
        src: &'a [u8],
        pos: usize,
        t: f64,
    }

    impl ExprEval<'_> {
        fn eval(expr: &str, t: f64) -> f64 {
            let mut eval = ExprEval { src: expr.as_bytes(), pos: 0, t };
            let value = eval.sum();
            assert_eq!(eval.pos, eval.src.len(), "trailing input in {}", expr);
            value
        }

        fn peek(&self) -> Option<u8> {
            self.src.get(self.pos).copied()
        }

        fn expect(&mut self, c: u8) {
            assert_eq!(self.peek(), Some(c));
            self.pos += 1;
        }

        fn sum(&mut self) -> f64 {
            let mut value = self.product();
            while let Some(op @ (b'+' | b'-')) = self.peek() {
                self.pos += 1;
                let rhs = self.product();
                value = if op == b'+' { value + rhs } else { value - rhs };
            }
            value
        }

        fn product(&mut self) -> f64 {
            let mut value = self.factor();
            while let Some(op @ (b'*' | b'/')) = self.peek() {
                self.pos += 1;
                let rhs = self.factor();
                value = if op == b'*' { value * rhs } else { value / rhs };
            }
            value
        }

        fn factor(&mut self) -> f64 {
            match self.peek() {
                Some(b'-') => {
                    self.pos += 1;
                    -self.factor()
                }
                Some(b'(') => {
                    self.pos += 1;
                    let value = self.sum();
                    self.expect(b')');
                    value
                }
                Some(c) if c.is_ascii_digit() => {
                    let start = self.pos;
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'.') {
                        self.pos += 1;
                    }
                    std::str::from_utf8(&self.src[start..self.pos])
                        .unwrap()
                        .parse()
                        .unwrap()
                }
                _ => {
                    let start = self.pos;
                    while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    let name = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_string();
                    if name == "t" {
                        return self.t;
                    }
                    self.expect(b'(');
                    let mut args = vec![self.sum()];
                    while self.peek() == Some(b',') {
                        self.pos += 1;
                        args.push(self.sum());
                    }
                    self.expect(b')');
                    let truth = |b: bool| if b { 1.0 } else { 0.0 };
                    match name.as_str() {
                        "lt" => truth(args[0] < args[1]),
                        "gt" => truth(args[0] > args[1]),
                        "min" => args[0].min(args[1]),
                        "if" => if args[0] != 0.0 { args[1] } else { args[2] },
                        other => panic!("unexpected function {}", other),
                    }
                }
            }
        }
    }

    #[test]
    fn expression_agrees_with_displacement() {
        let flags = [(true, true), (true, false), (false, true)];
        for direction in ALL {
            for (configured, duration) in [(1.0, 4.0), (0.5, 3.0), (3.0, 2.0), (0.75, 6.0)] {
                for (slide_in, slide_out) in flags {
                    let motion = SlideMotion::new(direction, configured, duration, slide_in, slide_out);
                    let expr = motion.displacement_expr();
                    let window = motion.window;
                    let out_start = duration - window;

                    // 分支边界正好落在滑入结束与滑出开始处
                    if slide_in {
                        assert!(expr.contains(&format!("lt(t,{:.6})", window)), "{}", expr);
                    }
                    if slide_out {
                        assert!(expr.contains(&format!("gt(t,{:.6})", out_start)), "{}", expr);
                    }

                    let mut samples: Vec<f64> = (0..=40).map(|i| duration * i as f64 / 40.0).collect();
                    samples.extend([window, out_start, window - 1e-3, out_start + 1e-3, duration]);
                    for t in samples {
                        let expected = motion.displacement(t);
                        let actual = ExprEval::eval(&expr, t);
                        assert!(
                            (expected - actual).abs() < 1e-6,
                            "{:?} t={} numeric={} expr={} ({})",
                            direction,
                            t,
                            expected,
                            actual,
                            expr
                        );
                    }
                    assert_eq!(ExprEval::eval(&expr, window), motion.displacement(window));
                    if slide_in && !slide_out {
                        assert_eq!(ExprEval::eval(&expr, window), 0.0);
                    }
                    if slide_out && !slide_in {
                        assert_eq!(ExprEval::eval(&expr, out_start), 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn direction_names() {
        assert_eq!(SlideDirection::Down.to_string(), "down");
        let parsed: SlideDirection = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(parsed, SlideDirection::Right);
    }
}
