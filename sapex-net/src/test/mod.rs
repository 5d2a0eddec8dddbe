// Sapex-Sim: discrete-event simulator for inter-domain path-selection algorithms
// Copyright (C) 2024 Sapex-Sim Contributors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! End-to-end scenario tests: a full topology build driven through
//! selection, pacing, link delivery and fault injection together, rather
//! than one module's unit tests in isolation.

mod common;
mod probe_rtt;
mod star_single_flow;
