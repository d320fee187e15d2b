//! 连通性与寻路：越界判断、墙体阻挡判断以及支持跳跃的 BFS 最短路径。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::{in_bounds, Orientation, Position, Wall, BOARD_SIZE};

/// 方向探索顺序固定为 上、下、左、右，决定 BFS 的平局取舍。
pub const DIRECTIONS: [(i8, i8); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

const CELLS: usize = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub distance: u32,
    pub next_step: Option<Position>,
    pub path: Vec<Position>,
}

/// `from` 与相邻格 `to` 之间的直线通行是否被墙阻断。
///
/// 非相邻的两格一律视为阻断。
pub fn is_blocked(from: Position, to: Position, walls: &[Wall]) -> bool {
    let dx = i16::from(to.x) - i16::from(from.x);
    let dy = i16::from(to.y) - i16::from(from.y);
    match (dx, dy) {
        (0, 1) | (0, -1) => {
            let row = from.y.min(to.y);
            walls.iter().any(|wall| {
                wall.orientation == Orientation::Horizontal
                    && wall.y == row
                    && (wall.x == from.x || from.x.checked_sub(1) == Some(wall.x))
            })
        }
        (1, 0) | (-1, 0) => {
            let column = from.x.min(to.x);
            walls.iter().any(|wall| {
                wall.orientation == Orientation::Vertical
                    && wall.x == column
                    && (wall.y == from.y || from.y.checked_sub(1) == Some(wall.y))
            })
        }
        _ => true,
    }
}

/// 从 `from` 沿 `(dx, dy)` 走一步可以到达的格子。
///
/// 对手所在格不可停留：优先直线跳过，直线受阻或越界时改为两侧斜跳。
/// 结果顺序即探索顺序。
pub fn step_targets(
    from: Position,
    (dx, dy): (i8, i8),
    walls: &[Wall],
    opponent: Option<Position>,
) -> Vec<Position> {
    let neighbor = from.offset(dx, dy);
    if !in_bounds(neighbor) || is_blocked(from, neighbor, walls) {
        return Vec::new();
    }
    if opponent != Some(neighbor) {
        return vec![neighbor];
    }

    let jump = neighbor.offset(dx, dy);
    if in_bounds(jump) && !is_blocked(neighbor, jump, walls) {
        return vec![jump];
    }

    // perpendicular sidesteps from the opponent's cell
    let sides = if dx == 0 {
        [(-1, 0), (1, 0)]
    } else {
        [(0, -1), (0, 1)]
    };
    sides
        .iter()
        .map(|&(sx, sy)| neighbor.offset(sx, sy))
        .filter(|&diagonal| in_bounds(diagonal) && !is_blocked(neighbor, diagonal, walls))
        .collect()
}

fn index(position: Position) -> usize {
    position.y as usize * BOARD_SIZE as usize + position.x as usize
}

/// 从 `start` 到第 `target_row` 行的最短路径；不可达时返回 `None`。
///
/// 传入 `opponent` 时对手格按跳跃规则穿越，本身不会成为路径节点。
pub fn shortest_path(
    start: Position,
    target_row: i8,
    walls: &[Wall],
    opponent: Option<Position>,
) -> Option<PathResult> {
    if !in_bounds(start) {
        return None;
    }
    if start.y == target_row {
        return Some(PathResult {
            distance: 0,
            next_step: None,
            path: vec![start],
        });
    }

    let mut parent: [Option<Position>; CELLS] = [None; CELLS];
    let mut visited = [false; CELLS];
    let mut queue = VecDeque::new();

    visited[index(start)] = true;
    if let Some(opponent) = opponent.filter(|&pos| in_bounds(pos)) {
        visited[index(opponent)] = true;
    }
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for direction in DIRECTIONS {
            for next in step_targets(current, direction, walls, opponent) {
                if visited[index(next)] {
                    continue;
                }
                visited[index(next)] = true;
                parent[index(next)] = Some(current);
                if next.y == target_row {
                    return Some(build_path(next, &parent));
                }
                queue.push_back(next);
            }
        }
    }

    None
}

fn build_path(goal: Position, parent: &[Option<Position>; CELLS]) -> PathResult {
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(previous) = parent[index(cursor)] {
        path.push(previous);
        cursor = previous;
    }
    path.reverse();
    PathResult {
        distance: (path.len() - 1) as u32,
        next_step: path.get(1).copied(),
        path,
    }
}

/// 便捷函数：只关心距离时使用。
pub fn distance_to_row(
    start: Position,
    target_row: i8,
    walls: &[Wall],
    opponent: Option<Position>,
) -> Option<u32> {
    shortest_path(start, target_row, walls, opponent).map(|result| result.distance)
}
